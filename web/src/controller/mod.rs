pub(crate) mod health_check_controller;
pub(crate) mod user_session_controller;
