pub mod node_class;
