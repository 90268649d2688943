pub mod auth;
pub mod districts;
pub mod health;
pub mod inventory;
pub mod items;
pub mod metrics;
pub mod request_id;
pub mod spatial;
pub mod stores;
pub mod users;
