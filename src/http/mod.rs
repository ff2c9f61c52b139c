// HTTP helpers module entry point

pub mod mime;
pub mod response;

pub use response::{
    build_404_response, build_405_response, build_asset_response, build_error_response,
    build_html_response, build_options_response, build_text_response, build_413_response,
    json_response,
};
