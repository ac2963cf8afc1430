//! Static file serving module
//!
//! Handles static file loading, MIME type detection, and response building.

use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve a request path from the static directory
pub async fn serve(
    path: &str,
    is_head: bool,
    static_dir: &str,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    match load_from_directory(static_dir, path, index_files).await {
        Some((content, content_type)) => http::build_static_response(content, content_type, is_head),
        None => http::build_404_response(),
    }
}

/// Load a static file from the directory with index file support
pub async fn load_from_directory(
    static_dir: &str,
    path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slash and prevent directory traversal
    let clean_path = path.trim_start_matches('/').replace("..", "");

    let mut file_path = Path::new(static_dir).join(&clean_path);

    // Security: ensure file_path is within static_dir
    let static_dir_canonical = match Path::new(static_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{static_dir}': {e}"
            ));
            return None;
        }
    };

    // Directory request: try index files
    if file_path.is_dir() || clean_path.is_empty() || clean_path.ends_with('/') {
        for index_file in index_files {
            let index_path = file_path.join(index_file);
            if index_path.is_file() {
                file_path = index_path;
                break;
            }
        }
    }

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            return None;
        }
    };

    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Per-test fixture directory under the system temp dir
    struct Fixture {
        root: std::path::PathBuf,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let root = std::env::temp_dir().join(format!(
                "webfront-static-{name}-{}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&root);
            fs::create_dir_all(&root).unwrap();
            Self { root }
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.root.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }

        fn dir(&self) -> &str {
            self.root.to_str().unwrap()
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    fn index_files() -> Vec<String> {
        vec!["index.html".to_string()]
    }

    #[tokio::test]
    async fn test_serves_file_with_content_type() {
        let fx = Fixture::new("plain");
        fx.write("app.js", "console.log(1);");

        let (content, content_type) = load_from_directory(fx.dir(), "/app.js", &index_files())
            .await
            .unwrap();
        assert_eq!(content, b"console.log(1);");
        assert_eq!(content_type, "application/javascript");
    }

    #[tokio::test]
    async fn test_root_resolves_index() {
        let fx = Fixture::new("index");
        fx.write("index.html", "<html></html>");

        let (content, content_type) = load_from_directory(fx.dir(), "/", &index_files())
            .await
            .unwrap();
        assert_eq!(content, b"<html></html>");
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_subdirectory_resolves_index() {
        let fx = Fixture::new("subdir");
        fx.write("docs/index.html", "docs");

        let result = load_from_directory(fx.dir(), "/docs/", &index_files()).await;
        assert_eq!(result.unwrap().0, b"docs");
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let fx = Fixture::new("missing");
        fx.write("index.html", "x");

        assert!(load_from_directory(fx.dir(), "/nope.css", &index_files())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_traversal_is_blocked() {
        let fx = Fixture::new("traversal");
        fx.write("index.html", "x");
        // A sibling of the static root that must stay unreachable
        let secret = fx.root.parent().unwrap().join(format!(
            "webfront-secret-{}",
            std::process::id()
        ));
        fs::write(&secret, "secret").unwrap();

        let rel = format!("/../{}", secret.file_name().unwrap().to_str().unwrap());
        let result = load_from_directory(fx.dir(), &rel, &index_files()).await;
        let _ = fs::remove_file(&secret);
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_serve_head_strips_body() {
        let fx = Fixture::new("head");
        fx.write("index.html", "<html></html>");

        let response = serve("/", true, fx.dir(), &index_files()).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("Content-Length").unwrap(), "13");
    }

    #[tokio::test]
    async fn test_serve_missing_is_404() {
        let fx = Fixture::new("serve404");
        let response = serve("/gone.png", false, fx.dir(), &index_files()).await;
        assert_eq!(response.status(), 404);
    }
}
