mod output;

pub use output::{
    display_error, display_inspector, display_notice, display_sessions, print_delta,
};
