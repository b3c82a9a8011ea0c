mod blueprint;
mod common;
mod progress;
mod routing;
