//! End-to-end tests for the harvesting commands, driven through `repo_harvest::run`.

use repo_harvest::Host;
use serde_json::json;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test host that captures output to in-memory buffers.
struct TestHost {
    output_buf: Vec<u8>,
    error_buf: Vec<u8>,
}

impl TestHost {
    const fn new() -> Self {
        Self {
            output_buf: Vec::new(),
            error_buf: Vec::new(),
        }
    }

    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }
}

impl Host for TestHost {
    fn output(&mut self) -> impl std::io::Write {
        Cursor::new(&mut self.output_buf)
    }

    fn error(&mut self) -> impl std::io::Write {
        Cursor::new(&mut self.error_buf)
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn write_config(dir: &Path, extra: &str) -> String {
    let config_path = dir.join("harvest.toml");
    let text = format!("pacing_delay = \"0s\"\ntransient_retry_delay = \"10ms\"\nquota_safety_margin = \"10ms\"\n{extra}");
    fs::write(&config_path, text).expect("write config");
    path_str(&config_path).to_string()
}

#[tokio::test]
async fn test_init_writes_default_config() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("generated.toml");

    let mut host = TestHost::new();
    repo_harvest::run(&mut host, ["repo-harvest", "init", path_str(&output)])
        .await
        .expect("init should succeed");

    let written = fs::read_to_string(&output).expect("config file written");
    assert!(written.contains("max_attempts = 5"));
    assert!(host.output_str().contains("Generated default configuration file"));
}

#[tokio::test]
async fn test_readme_command_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/contents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "README.md", "path": "README.md", "type": "file", "encoding": "base64",
             "content": "cGlwIGluc3RhbGwgaGVsbG8K"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/gone/contents/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_config(dir.path(), &format!("github_api_url = \"{}\"\n", server.uri()));
    let input = dir.path().join("repos.csv");
    let output = dir.path().join("readme.csv");
    fs::write(
        &input,
        "name;html_url\nhello;https://github.com/octo/hello\ngone;https://github.com/octo/gone\nbad;nan\n",
    )
    .expect("write input");

    let mut host = TestHost::new();
    repo_harvest::run(
        &mut host,
        [
            "repo-harvest",
            "readme",
            "--input",
            path_str(&input),
            "--output",
            path_str(&output),
            "--config",
            &config,
            "--github-token",
            "test-token",
            "--log-level",
            "error",
        ],
    )
    .await
    .expect("readme command should succeed");

    let mut reader = csv::Reader::from_path(&output).expect("output readable");
    let headers: Vec<String> = reader.headers().expect("headers").iter().map(str::to_string).collect();
    assert_eq!(headers, ["name", "html_url", "readme"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("record")).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][2], "README_start\npip install hello\n\nREADME_end");
    assert_eq!(&rows[1][2], "");
    assert_eq!(&rows[2][2], "");

    assert!(
        host.output_str()
            .contains("Successfully retrieved READMEs for 1 out of 3 repositories"),
        "unexpected output: {}",
        host.output_str()
    );
}

#[tokio::test]
async fn test_downloads_command_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/packages/hello/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"last_day": 1, "last_week": 7, "last_month": 30}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/downloads/point/last-month/widget"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_config(
        dir.path(),
        &format!("pypi_stats_url = \"{0}\"\nnpm_stats_url = \"{0}\"\n", server.uri()),
    );
    let input = dir.path().join("readme.csv");
    let output = dir.path().join("download_stats.csv");
    fs::write(
        &input,
        "html_url,readme\n\
         https://github.com/octo/hello,\"README_start\npip install hello\nREADME_end\"\n\
         https://github.com/octo/widget,\"README_start\nnpm install widget\nREADME_end\"\n\
         https://github.com/octo/quiet,\n",
    )
    .expect("write input");

    let mut host = TestHost::new();
    repo_harvest::run(
        &mut host,
        [
            "repo-harvest",
            "downloads",
            "--input",
            path_str(&input),
            "--output",
            path_str(&output),
            "--config",
            &config,
            "--log-level",
            "error",
        ],
    )
    .await
    .expect("downloads command should succeed");

    let text = fs::read_to_string(&output).expect("output written");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("repository_name,owner,registry,last_month,date"));
    let row = lines.next().expect("one record");
    assert!(row.starts_with("hello,octo,pypi,30,"), "unexpected row: {row}");
    assert_eq!(lines.next(), None);

    assert!(host.output_str().contains("for 1 out of 3 repositories"));
}

#[tokio::test]
async fn test_downloads_command_requires_readme_column() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_config(dir.path(), "");
    let input = dir.path().join("plain.csv");
    fs::write(&input, "html_url\nhttps://github.com/octo/hello\n").expect("write input");

    let mut host = TestHost::new();
    let result = repo_harvest::run(
        &mut host,
        [
            "repo-harvest",
            "downloads",
            "--input",
            path_str(&input),
            "--output",
            path_str(&dir.path().join("out.csv")),
            "--config",
            &config,
            "--log-level",
            "error",
        ],
    )
    .await;

    let err = result.expect_err("missing readme column must fail");
    assert!(format!("{err:#}").contains("readme"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_howfairis_command_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");

    // Stand-in checker: every repository meets the first two recommendations, and one
    // repository name makes the checker fail.
    let script = r#"case "$1" in
  *broken*) echo "KeyError: 'license'" >&2; exit 1 ;;
esac
printf '(1/5) repository\n  \342\234\223 ok\n(2/5) license\n  \342\234\223 ok\n(3/5) registry\n(4/5) citation\n(5/5) checklist\n'"#;
    let command = toml::to_string(&json!({ "compliance_command": ["sh", "-c", script, "howfairis"] })).expect("toml");
    let config = write_config(dir.path(), &format!("max_attempts = 1\n{command}"));

    let input = dir.path().join("repos.csv");
    let output = dir.path().join("howfairis.csv");
    fs::write(
        &input,
        "html_url\nhttps://github.com/octo/hello/tree/main\nhttps://gitlab.com/octo/broken\n",
    )
    .expect("write input");

    let mut host = TestHost::new();
    repo_harvest::run(
        &mut host,
        [
            "repo-harvest",
            "howfairis",
            "--input",
            path_str(&input),
            "--output",
            path_str(&output),
            "--config",
            &config,
            "--log-level",
            "error",
        ],
    )
    .await
    .expect("howfairis command should succeed");

    let text = fs::read_to_string(&output).expect("output written");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("html_url,howfairis_repository,howfairis_license,howfairis_registry,howfairis_citation,howfairis_checklist,date")
    );
    let row = lines.next().expect("one record");
    assert!(row.starts_with("https://github.com/octo/hello,True,True,False,False,False,"), "unexpected row: {row}");
    assert_eq!(lines.next(), None);

    assert!(host.output_str().contains("for 1 out of 2 repositories"));
}
