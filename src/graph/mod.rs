pub mod build_rule;
pub mod class_to_source;
pub mod digraph;
pub mod emit;
pub mod package_layout;
pub mod preprocess;
pub mod rule_kind;
pub mod scc;
