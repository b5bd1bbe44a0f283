pub mod controller;
pub mod gateway;
pub mod model;
pub mod router;
pub mod service;
