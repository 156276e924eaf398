pub mod force_graph;
pub mod history_tree;
