use anyhow::{Context, Result};
use log::{error, info};
use reqwest::Url;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

use crate::query::{parse_page, QueryService};

pub fn routes(
    service: Arc<QueryService>,
    fallback_authority: String,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("data")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(warp::header::optional::<String>("host"))
        .and(warp::path::full())
        .and(warp::any().map(move || fallback_authority.clone()))
        .and(warp::any().map(move || service.clone()))
        .and_then(data_handler)
}

async fn data_handler(
    params: Vec<(String, String)>,
    host: Option<String>,
    path: FullPath,
    fallback_authority: String,
    service: Arc<QueryService>,
) -> Result<warp::reply::Response, Infallible> {
    let page = parse_page(
        params
            .iter()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.as_str()),
    );

    let authority = host.unwrap_or(fallback_authority);
    let outcome = match request_url(&authority, path.as_str(), &params) {
        Ok(url) => service.get_page(page, &url).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => Ok(warp::reply::json(&result).into_response()),
        Err(e) => {
            error!("Error: {:#}", e);
            let body = warp::reply::json(&json!({ "error": "An error occurred" }));
            Ok(warp::reply::with_status(body, StatusCode::INTERNAL_SERVER_ERROR).into_response())
        }
    }
}

fn request_url(authority: &str, path: &str, params: &[(String, String)]) -> Result<Url> {
    let mut url = Url::parse(&format!("http://{}{}", authority, path))
        .with_context(|| format!("cannot rebuild request url from host {:?}", authority))?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

pub async fn serve(service: Arc<QueryService>, addr: SocketAddr, fallback_authority: String) {
    info!("API server is running on {}", addr);
    warp::serve(routes(service, fallback_authority)).run(addr).await;
}
