pub mod contract;
pub mod recolor_node;
