use actix_web::{web, HttpResponse};
use rust_embed::RustEmbed;

use crate::error::ApiError;

/// Stylesheet and other static files compiled into the binary.
#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

fn content_type(file: &str) -> mime::Mime {
    match file.rsplit_once('.').map(|(_, ext)| ext) {
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("svg") => mime::IMAGE_SVG,
        Some("png") => mime::IMAGE_PNG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

pub async fn serve(path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let file = path.into_inner();
    let asset = Assets::get(&file).ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok()
        .content_type(content_type(&file))
        .insert_header(("Cache-Control", "public, max-age=3600"))
        .body(asset.data.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_is_embedded() {
        assert!(Assets::get("style.css").is_some());
        assert_eq!(content_type("style.css"), mime::TEXT_CSS_UTF_8);
        assert_eq!(content_type("blob"), mime::APPLICATION_OCTET_STREAM);
    }
}
