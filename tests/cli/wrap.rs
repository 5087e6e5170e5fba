use anyhow::Result;
use insta::assert_snapshot;
use serde_json::Value;

use crate::{CliTest, stderr, stdout};

const GREETING: &str = "function Greeting(){ return <div>안녕하세요</div>; }\n";

#[test]
fn test_wrap_greeting() -> Result<()> {
    let test = CliTest::with_file("src/Greeting.tsx", GREETING)?;

    let output = test.wrap_command().output()?;

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "wrapped src/Greeting.tsx  1 node\n\u{2713} Wrapped 1 node in 1 of 1 file\n"
    );
    assert_snapshot!(test.read_file("src/Greeting.tsx")?, @r#"
    "use client";
    import { useTranslation } from "i18nexus";
    function Greeting(){ const { t } = useTranslation(); return <div>{t("안녕하세요")}</div>; }
    "#);

    Ok(())
}

#[test]
fn test_wrap_dry_run_leaves_files() -> Result<()> {
    let test = CliTest::with_file("src/Greeting.tsx", GREETING)?;

    let output = test.wrap_command().arg("--dry-run").output()?;

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with("would wrap src/Greeting.tsx  1 node\n"));
    assert_eq!(test.read_file("src/Greeting.tsx")?, GREETING);

    Ok(())
}

#[test]
fn test_wrap_twice_changes_nothing() -> Result<()> {
    let test = CliTest::with_file("src/Greeting.tsx", GREETING)?;

    test.wrap_command().output()?;
    let first = test.read_file("src/Greeting.tsx")?;
    let output = test.wrap_command().output()?;

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Checked 1 source file - nothing to wrap"));
    assert_eq!(test.read_file("src/Greeting.tsx")?, first);

    Ok(())
}

#[test]
fn test_wrap_continues_past_parse_error() -> Result<()> {
    let test = CliTest::with_file("src/Greeting.tsx", GREETING)?;
    test.write_file("src/Broken.tsx", "export function Broken( {\n")?;

    let output = test.wrap_command().output()?;
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(out.contains("error[parse]"));
    assert!(out.contains("--> src/Broken.tsx"));
    assert!(out.contains("\u{2718} 1 of 2 files failed (1 modified, 0 unchanged)"));
    assert!(test.read_file("src/Greeting.tsx")?.contains("t(\"안녕하세요\")"));
    assert_eq!(
        test.read_file("src/Broken.tsx")?,
        "export function Broken( {\n"
    );

    Ok(())
}

#[test]
fn test_wrap_json_output() -> Result<()> {
    let test = CliTest::with_file("src/Greeting.tsx", GREETING)?;
    test.write_file("src/Plain.tsx", "export const Plain = () => <p>Hello</p>;\n")?;

    let output = test
        .wrap_command()
        .args(["--format", "json", "--jobs", "2"])
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["files"][0]["path"], "src/Greeting.tsx");
    assert_eq!(report["files"][0]["outcome"], "modified");
    assert_eq!(report["files"][0]["keys"][0], "안녕하세요");
    assert_eq!(report["files"][1]["outcome"], "unchanged");
    assert_eq!(report["stats"]["totalFiles"], 2);
    assert_eq!(report["stats"]["workerCount"], 2);

    Ok(())
}

#[test]
fn test_wrap_uses_config_file() -> Result<()> {
    let test = CliTest::with_file(
        ".twraprc.json",
        r#"{ "mode": "server", "translationImportSource": "@/i18n" }"#,
    )?;
    test.write_file(
        "src/app/page.tsx",
        "export default function Page() {\n  return <h1>제목</h1>;\n}\n",
    )?;

    let output = test.wrap_command().output()?;

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_snapshot!(test.read_file("src/app/page.tsx")?, @r#"
    import { getServerTranslation } from "@/i18n";
    export default async function Page() {
      const { t } = await getServerTranslation();
      return <h1>{t("제목")}</h1>;
    }
    "#);

    Ok(())
}

#[test]
fn test_cli_flags_override_config() -> Result<()> {
    let test = CliTest::with_file(".twraprc.json", r#"{ "mode": "server" }"#)?;
    test.write_file(
        "app/Title.tsx",
        "export const Title = () => <h1>제목</h1>;\n",
    )?;

    let output = test
        .wrap_command()
        .args(["--mode", "client", "--framework", "react", "--pattern", "app/**/*.tsx"])
        .output()?;

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let content = test.read_file("app/Title.tsx")?;
    assert!(content.starts_with("import { useTranslation } from \"i18nexus\";\n"));
    assert!(content.contains("const { t } = useTranslation();"));
    assert!(!content.contains("use client"));

    Ok(())
}

#[test]
fn test_wrap_invalid_config_is_fatal() -> Result<()> {
    let test = CliTest::with_file(".twraprc.json", r#"{ "workers": 0 }"#)?;
    test.write_file("src/Greeting.tsx", GREETING)?;

    let output = test.wrap_command().output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("'workers' must be at least 1"));
    assert_eq!(test.read_file("src/Greeting.tsx")?, GREETING);

    Ok(())
}

#[test]
fn test_wrap_empty_project() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.wrap_command().output()?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        "\u{2713} Checked 0 source files - nothing to wrap\n"
    );

    Ok(())
}

#[test]
fn test_wrap_honors_ignore_marker() -> Result<()> {
    let source = r#"export function Banner() {
  return (
    <div>
      {/* i18n-ignore */}
      <span>브랜드</span>
      <p>환영합니다</p>
    </div>
  );
}
"#;
    let test = CliTest::with_file("src/Banner.tsx", source)?;

    let output = test.wrap_command().output()?;

    assert_eq!(output.status.code(), Some(0));
    let content = test.read_file("src/Banner.tsx")?;
    assert!(content.contains("<span>브랜드</span>"));
    assert!(content.contains("<p>{t(\"환영합니다\")}</p>"));

    Ok(())
}

#[test]
fn test_wrap_root_flag() -> Result<()> {
    let test = CliTest::with_file("web/src/Greeting.tsx", GREETING)?;

    let output = test.wrap_command().args(["--root", "web"]).output()?;

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("wrapped src/Greeting.tsx"));

    Ok(())
}
