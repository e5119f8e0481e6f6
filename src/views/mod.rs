//! Page view-models: everything the dashboard renders is assembled here from
//! raw backend data, without touching the network.

pub mod assignments;
pub mod dashboard;
pub mod deliveries;
pub mod drivers;
pub mod forms;
pub mod map;
pub mod status;
