//! Demo client for <https://httpbin.org>.
//!
//! Run with `RUST_LOG=parcel=debug,httpbin=info cargo run -p httpbin` to see
//! the cURL form of every call.

#![allow(missing_docs)]
#![allow(clippy::print_stdout)]

use std::collections::BTreeMap;

use parcel::prelude::*;
use parcel::pretty_error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Copy, Record)]
#[record(rename_all = "lowercase")]
#[allow(dead_code)]
enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Record)]
#[record(rename_all = "camelCase")]
struct Search {
    name_prefix: String,
    page: Option<u32>,
    order: Order,
}

#[derive(Debug, Record)]
#[record(rename_all = "camelCase")]
struct CreateNote {
    title: String,
    tags: Vec<String>,
    pinned: bool,
}

#[derive(Record)]
struct Upload {
    description: String,
    attachment: MultipartFile,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Deserialize)]
struct Echo {
    #[serde(default)]
    args: BTreeMap<String, String>,
    #[serde(default)]
    json: Option<serde::de::IgnoredAny>,
    #[serde(default)]
    form: BTreeMap<String, String>,
    #[serde(default)]
    files: BTreeMap<String, String>,
    url: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Slideshow {
    title: String,
    author: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct SlideshowDocument {
    slideshow: Slideshow,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> parcel::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "httpbin=info,parcel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url = Url::parse("https://httpbin.org/")
        .map_err(|err| parcel::Error::invalid_url(err.to_string()))?;
    let cache = ResponseCache::new();

    let transport = HyperTransport::builder()
        .user_agent("parcel-httpbin-demo/0.1.0")
        .with_logging()
        .build();
    let client = Client::builder(transport, base_url)
        .interceptor(LoggingInterceptor::new())
        .interceptor(BearerAuthInterceptor::new("demo-token"))
        .interceptor(cache.clone())
        .build();

    tracing::info!(base_url = %client.base_url(), "client ready");

    // Query from a record, merged with the query already in the path
    let search = Search {
        name_prefix: "ad".to_string(),
        page: Some(2),
        order: Order::Desc,
    };
    let echo = client
        .get("get?page=1&source=demo")
        .query_record(&search)
        .send::<Json<Echo>>()
        .await?
        .into_json();
    if let Some(echo) = echo {
        println!("GET {}", echo.url);
        for (key, value) in &echo.args {
            println!("  {key} = {value}");
        }
    }

    // JSON body from a record
    let note = CreateNote {
        title: "Groceries".to_string(),
        tags: vec!["home".to_string(), "weekly".to_string()],
        pinned: false,
    };
    let response = client
        .post("post", Body::Empty)
        .json(&note)
        .send::<Json<Echo>>()
        .await?;
    println!(
        "POST status={} echoed_json={}",
        response.status(),
        response.payload().is_some_and(|echo| echo.0.json.is_some())
    );

    // Multipart form from a record holding a file
    let upload = Upload {
        description: "demo upload".to_string(),
        attachment: MultipartFile::from_bytes("hello.txt", "Hello, httpbin!"),
    };
    let response = client
        .post("post", Form::from_record(&upload))
        .send::<Json<Echo>>()
        .await?;
    if let Some(echo) = response.into_json() {
        println!("MULTIPART form={:?} files={:?}", echo.form, echo.files.keys());
    }

    // Second read is served by the cache interceptor
    for attempt in 1..=2 {
        let response = client
            .get("json")
            .cache(CacheDirective::ReturnCacheElseLoad)
            .send::<Json<SlideshowDocument>>()
            .await?;
        println!(
            "CACHE attempt={attempt} status={} short_circuited={}",
            response.status(),
            response.is_short_circuited()
        );
    }
    println!("CACHE entries={}", cache.len());

    // A decoding failure, rendered for humans
    let failure = client.get("json").send::<Json<Vec<String>>>().await;
    if let Err(err) = failure {
        println!("{}", pretty_error(&err));
    }

    // A 4xx surfaced as an error
    let missing = client
        .get("status/404")
        .send::<()>()
        .await
        .and_then(TypedResponse::error_for_status);
    if let Err(err) = missing {
        println!("{}", pretty_error(&err));
    }

    Ok(())
}
