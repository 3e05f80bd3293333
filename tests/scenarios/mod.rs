mod config_loading;
mod interceptors;
mod rate_limiting;
