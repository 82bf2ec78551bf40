use std::error::Error;
use std::path::Path;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tower::ServiceExt;

use assetdag::dag::{ScheduledTask, TaskAction};
use assetdag::engine::RuntimeEvent;
use assetdag::serve::server::safe_relative;
use assetdag::serve::{self, CLIENT_PATH, ReloadHub, RunningServer, inject_client, router};
use assetdag::types::ReloadKind;
use assetdag_test_utils::builders::ConfigFileBuilder;
use assetdag_test_utils::fixture::Project;
use assetdag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

async fn get(root: &Path, uri: &str) -> Result<(StatusCode, String), Box<dyn Error>> {
    let app = router(root.to_path_buf(), ReloadHub::new());
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = res.status();
    let body = to_bytes(res.into_body(), 1024 * 1024).await?;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

#[test]
fn client_tag_goes_before_closing_body() {
    let html = inject_client("<html><BODY><p>x</p></BODY></html>");
    let tag = html.find(CLIENT_PATH).expect("tag injected");
    let close = html.find("</BODY>").expect("body kept");
    assert!(tag < close);

    let fragment = inject_client("<p>no body</p>");
    assert!(fragment.starts_with("<p>no body</p>"));
    assert!(fragment.contains(CLIENT_PATH));
}

#[test]
fn request_paths_cannot_escape_the_root() {
    assert_eq!(safe_relative("/css/main.css"), Some("css/main.css".into()));
    assert_eq!(safe_relative("/"), Some("".into()));
    assert_eq!(safe_relative("/../secret"), None);
    assert_eq!(safe_relative("/a/../../b"), None);
    assert_eq!(safe_relative("/%2e%2e/secret"), None);
    assert_eq!(safe_relative("/about%20us/index.html"), Some("about us/index.html".into()));
    assert_eq!(safe_relative("/bad%ff"), None);
}

#[tokio::test]
async fn percent_encoded_pages_get_the_reload_client() -> TestResult {
    let project = Project::new();
    project.write("dist/about us/index.html", "<html><body>about us</body></html>");
    let root = project.path("dist");

    let (status, body) = get(&root, "/about%20us/index.html").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("about us") && body.contains(CLIENT_PATH), "{body}");

    let (status, body) = get(&root, "/about%20us/").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(CLIENT_PATH), "{body}");
    Ok(())
}

#[tokio::test]
async fn html_pages_get_the_reload_client() -> TestResult {
    let project = Project::new();
    project
        .write("dist/index.html", "<html><body>home</body></html>")
        .write("dist/about/index.html", "<html><body>about</body></html>")
        .write("dist/css/main.css", "a{color:red}");
    let root = project.path("dist");

    let (status, body) = get(&root, "/").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("home") && body.contains(CLIENT_PATH), "{body}");

    let (_, body) = get(&root, "/about/").await?;
    assert!(body.contains("about") && body.contains(CLIENT_PATH));

    let (status, body) = get(&root, "/css/main.css").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "a{color:red}");

    let (status, body) = get(&root, CLIENT_PATH).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("EventSource"));

    let (status, _) = get(&root, "/missing.png").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn reload_events_reach_connected_browsers() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.mkdir("dist");
    let hub = ReloadHub::new();
    let server = RunningServer::bind("127.0.0.1", 0, project.path("dist"), hub.clone()).await?;

    let mut stream = TcpStream::connect(server.addr).await?;
    stream
        .write_all(
            b"GET /__assetdag/livereload HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n",
        )
        .await?;

    // The handler subscribes as soon as the request reaches it.
    timeout(Duration::from_secs(5), async {
        while hub.broadcast(ReloadKind::Styles) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    let mut received = String::new();
    let mut buf = [0u8; 1024];
    timeout(Duration::from_secs(5), async {
        while !received.contains("data: css") {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            received.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
        Ok::<_, std::io::Error>(())
    })
    .await??;

    assert!(received.starts_with("HTTP/1.1 200"), "{received}");
    assert!(received.contains("text/event-stream"));
    assert!(received.contains("data: css"));

    server.abort();
    Ok(())
}

#[tokio::test]
async fn serve_task_reports_progress_once_listening() -> TestResult {
    init_tracing();
    let project = Project::new();
    project.mkdir("src").mkdir("dist");
    let mut h = project.harness(ConfigFileBuilder::offline().build());

    let task = ScheduledTask {
        name: "serve".into(),
        action: TaskAction::Serve,
        run_id: 7,
    };
    let ctx = h.ctx.clone();
    let handle = tokio::spawn(async move { serve::start(&ctx, &task).await });

    let event = timeout(Duration::from_secs(5), h.runtime_rx.recv()).await?;
    match event {
        Some(RuntimeEvent::TaskProgressed { run_id, task }) => {
            assert_eq!(run_id, 7);
            assert_eq!(task, "serve");
        }
        other => panic!("expected progress, got {other:?}"),
    }
    assert!(!handle.is_finished());

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn serve_fails_when_the_port_is_taken() -> TestResult {
    let project = Project::new();
    project.mkdir("dist");
    let taken = RunningServer::bind("127.0.0.1", 0, project.path("dist"), ReloadHub::new()).await?;

    let h = project.harness(
        ConfigFileBuilder::offline()
            .serve("127.0.0.1", taken.addr.port(), false)
            .build(),
    );
    let task = ScheduledTask {
        name: "serve".into(),
        action: TaskAction::Serve,
        run_id: 1,
    };

    assert!(serve::start(&h.ctx, &task).await.is_err());
    taken.abort();
    Ok(())
}
