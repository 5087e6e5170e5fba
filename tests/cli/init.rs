use anyhow::{Context, Result};
use serde_json::Value;

use crate::{CliTest, stderr, stdout};

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    assert_eq!(parsed["sourcePattern"], "src/**/*.{js,jsx,ts,tsx}");
    assert_eq!(parsed["translationImportSource"], "i18nexus");
    assert_eq!(parsed["translationFunction"], "t");
    assert_eq!(parsed["hookName"], "useTranslation");
    assert_eq!(parsed["mode"], "client");
    assert_eq!(parsed["framework"], "nextjs");

    assert!(
        content.contains("  "),
        "Config should use 2-space indentation"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("init").output()?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "\u{2713} Created .twraprc.json\n");
    assert!(test.root().join(".twraprc.json").exists());
    assert_config_content(&test.read_file(".twraprc.json")?)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::with_file(".twraprc.json", "{}")?;

    let output = test.command().arg("init").output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains(".twraprc.json already exists"));
    assert_eq!(test.read_file(".twraprc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::new()?;

    test.command().arg("init").output()?;
    test.write_file(
        "src/app.tsx",
        "export function App() { return <div>안녕</div>; }\n",
    )?;

    let output = test.wrap_command().output()?;
    assert!(
        output.status.success(),
        "Wrap should work with initialized config. stderr: {}",
        stderr(&output)
    );
    assert!(test.read_file("src/app.tsx")?.contains("t(\"안녕\")"));

    Ok(())
}
