pub mod common;

mod relay_routes;
