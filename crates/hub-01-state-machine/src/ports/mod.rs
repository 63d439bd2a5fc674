pub mod api;

pub use api::StateMachineApi;
