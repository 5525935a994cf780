use serde::Deserialize;
use std::error::Error;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tiny_http::{Header, Method, Response, Server};

use crate::analyzer::{prompt, ModelBackend};
use crate::report::parser;
use crate::scanner::language;

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    code: String,
    language: Option<String>,
    filename: Option<String>,
}

/// Serve the analysis API. Runs on a plain thread; model calls are driven on
/// the provided tokio runtime handle.
pub fn run(
    addr: &str,
    backend: Arc<dyn ModelBackend>,
    handle: tokio::runtime::Handle,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let server = Server::http(addr).map_err(|e| format!("could not bind {}: {}", addr, e))?;

    println!("🛡️  Sentinel API listening on http://{}", addr);
    println!("   GET  /health");
    println!("   POST /analyze");
    println!("   POST /upload");

    for mut request in server.incoming_requests() {
        let mut body = Vec::new();
        if let Err(e) = request.as_reader().read_to_end(&mut body) {
            eprintln!("⚠️  Failed to read request body: {}", e);
            let _ = request.respond(json_response(400, r#"{"error":"unreadable body"}"#));
            continue;
        }

        let content_type = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Content-Type"))
            .map(|h| h.value.to_string())
            .unwrap_or_default();

        let response = route(
            request.method(),
            request.url(),
            &content_type,
            &body,
            &backend,
            &handle,
        );

        let _ = request.respond(response);
    }

    Ok(())
}

fn route(
    method: &Method,
    url: &str,
    content_type: &str,
    body: &[u8],
    backend: &Arc<dyn ModelBackend>,
    handle: &tokio::runtime::Handle,
) -> Response<std::io::Cursor<Vec<u8>>> {
    match (method, url) {
        (&Method::Get, "/health") => {
            let payload = serde_json::json!({ "status": "ok", "model": backend.name() });
            json_response(200, &payload.to_string())
        }

        (&Method::Post, "/analyze") => {
            let parsed: AnalyzeBody = match serde_json::from_slice(body) {
                Ok(b) => b,
                Err(e) => {
                    return json_response(
                        400,
                        &serde_json::json!({ "error": format!("invalid JSON body: {}", e) })
                            .to_string(),
                    )
                }
            };

            let lang = parsed
                .language
                .map(canonical_language)
                .or_else(|| {
                    parsed
                        .filename
                        .as_deref()
                        .map(|f| language::language_for(Path::new(f)).to_string())
                })
                .unwrap_or_else(|| "Unknown".to_string());

            analyze_snippet(backend, handle, &parsed.code, &lang)
        }

        (&Method::Post, "/upload") => {
            let (filename, code) = match parse_multipart(content_type, body) {
                Some(part) => part,
                None => {
                    return json_response(
                        400,
                        r#"{"error":"expected a multipart file upload"}"#,
                    )
                }
            };

            let lang = filename
                .as_deref()
                .map(|f| language::language_for(Path::new(f)).to_string())
                .unwrap_or_else(|| "Unknown".to_string());

            analyze_snippet(backend, handle, &code, &lang)
        }

        _ => json_response(404, r#"{"error":"not found"}"#),
    }
}

fn analyze_snippet(
    backend: &Arc<dyn ModelBackend>,
    handle: &tokio::runtime::Handle,
    code: &str,
    lang: &str,
) -> Response<std::io::Cursor<Vec<u8>>> {
    if code.trim().is_empty() {
        return json_response(400, r#"{"error":"no code provided"}"#);
    }

    let prompt = prompt::build_prompt(code, lang);
    match handle.block_on(backend.review(&prompt)) {
        Ok(text) => {
            let (findings, unparsed_notes) = parser::parse_findings(&text);
            let payload = serde_json::json!({
                "language": lang,
                "findings": findings,
                "unparsed_notes": unparsed_notes,
                "raw": text,
            });
            json_response(200, &payload.to_string())
        }
        Err(e) => json_response(
            502,
            &serde_json::json!({ "error": format!("model call failed: {}", e) }).to_string(),
        ),
    }
}

fn json_response(status: u16, body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .unwrap_or_else(|_| unreachable!("static header is valid"));

    Response::from_data(body.as_bytes().to_vec())
        .with_status_code(status)
        .with_header(header)
}

fn canonical_language(lang: String) -> String {
    let trimmed = lang.trim();
    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Minimal multipart/form-data extraction: pull the first file part's
/// filename and content. Good enough for single-file uploads; anything that
/// does not look like multipart yields `None`.
fn parse_multipart(content_type: &str, body: &[u8]) -> Option<(Option<String>, String)> {
    let boundary = content_type
        .split(';')
        .map(str::trim)
        .find_map(|p| p.strip_prefix("boundary="))?
        .trim_matches('"');

    let delimiter = format!("--{}", boundary);
    let text = String::from_utf8_lossy(body);

    for part in text.split(delimiter.as_str()) {
        let part = part.trim_start_matches(['\r', '\n']);
        if part.is_empty() || part.starts_with("--") {
            continue;
        }

        let (headers, content) = part
            .split_once("\r\n\r\n")
            .or_else(|| part.split_once("\n\n"))?;

        if !headers
            .to_ascii_lowercase()
            .contains("content-disposition")
        {
            continue;
        }

        let filename = headers.split("filename=").nth(1).map(|rest| {
            rest.trim_start_matches('"')
                .split(['"', ';', '\r', '\n'])
                .next()
                .unwrap_or("")
                .to_string()
        });

        let content = content.trim_end_matches(['\r', '\n']).to_string();
        return Some((filename.filter(|f| !f.is_empty()), content));
    }

    None
}
