pub use super::properties::Entity as Properties;
