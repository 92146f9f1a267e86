pub mod identity_store;
