//! Library-level properties of a full wrapping run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use twrap::config::{Config, Mode, WrapConfig};
use twrap::core::pipeline::WrapOutcome;
use twrap::error::ErrorKind;
use twrap::{run, wrap_source};

const SOURCES: &[(&str, &str)] = &[
    (
        "src/components/Header.tsx",
        r#"import Link from "next/link";

export function Header({ user }) {
  return (
    <header>
      <Link href="/">홈</Link>
      <span title="사용자 메뉴">{`${user.name}님 안녕하세요`}</span>
    </header>
  );
}
"#,
    ),
    (
        "src/components/Empty.tsx",
        r#"export const Empty = () => <p>표시할 항목이 없습니다</p>;
"#,
    ),
    (
        "src/hooks/useLabels.ts",
        r#"export function useLabels() {
  return { save: "저장", cancel: "취소" };
}
"#,
    ),
    (
        "src/lib/format.ts",
        r#"export const UNIT = "개";
export function format(n: number) {
  return `${n}개`;
}
"#,
    ),
    (
        "src/app/page.tsx",
        r#"'use client';

import { useState } from "react";

export default function Page() {
  const [count, setCount] = useState(0);
  // i18n-ignore
  const debug = "디버그";
  return (
    <main>
      <h1>대시보드</h1>
      <button onClick={() => setCount(count + 1)} aria-label="증가">
        {count}번 클릭
      </button>
    </main>
  );
}
"#,
    ),
    (
        "src/components/Notice.tsx",
        r#"const PATTERN = "src/**/*.tsx";

export function Notice() {
  // i18n-ignore
  const raw = "원본 공지";
  return <p title={PATTERN}>공지사항</p>;
}
"#,
    ),
    (
        "src/app/english.tsx",
        r#"export default function English() {
  return <p>Hello world</p>;
}
"#,
    ),
];

fn project() -> Result<TempDir> {
    let dir = TempDir::new()?;
    fs::create_dir(dir.path().join(".git"))?;
    for (path, content) in SOURCES {
        let file = dir.path().join(path);
        fs::create_dir_all(file.parent().unwrap())?;
        fs::write(file, content)?;
    }
    Ok(dir)
}

fn config(root: &Path, workers: usize) -> WrapConfig {
    Config {
        workers: Some(workers),
        ..Config::default()
    }
    .resolve(root)
    .unwrap()
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    SOURCES
        .iter()
        .map(|(path, _)| {
            (
                PathBuf::from(path),
                fs::read_to_string(root.join(path)).unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_worker_count_does_not_change_output() -> Result<()> {
    let single = project()?;
    let parallel = project()?;

    run(config(single.path(), 1))?;
    run(config(parallel.path(), 4))?;

    assert_eq!(snapshot(single.path()), snapshot(parallel.path()));
    Ok(())
}

#[test]
fn test_second_run_changes_nothing() -> Result<()> {
    let dir = project()?;

    let first = run(config(dir.path(), 3))?;
    let after_first = snapshot(dir.path());
    let second = run(config(dir.path(), 3))?;

    assert!(first.stats.modified_files > 0);
    assert_eq!(second.stats.modified_files, 0);
    assert_eq!(snapshot(dir.path()), after_first);
    Ok(())
}

#[test]
fn test_every_file_is_counted_once() -> Result<()> {
    let dir = project()?;
    fs::write(dir.path().join("src/Broken.tsx"), "export const = ;\n")?;

    let summary = run(config(dir.path(), 2))?;

    assert!(summary.stats.is_consistent());
    assert_eq!(summary.stats.total_files, SOURCES.len() + 1);
    assert_eq!(summary.results.len(), SOURCES.len() + 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].1.kind(), ErrorKind::Parse);
    assert_eq!(summary.stats.per_worker.values().sum::<usize>(), SOURCES.len() + 1);
    assert!(summary.stats.per_worker.keys().all(|w| *w < 2));
    Ok(())
}

#[test]
fn test_expected_rewrites() -> Result<()> {
    let dir = project()?;
    let summary = run(config(dir.path(), 2))?;

    let outcome = |path: &str| {
        summary
            .results
            .iter()
            .find(|r| r.path == dir.path().join(path))
            .map(|r| r.outcome.clone())
    };
    assert_eq!(outcome("src/app/english.tsx"), Some(WrapOutcome::Unchanged));
    assert_eq!(outcome("src/lib/format.ts"), Some(WrapOutcome::Unchanged));

    let page = fs::read_to_string(dir.path().join("src/app/page.tsx"))?;
    assert!(page.starts_with("'use client';\nimport { useTranslation } from \"i18nexus\";\n"));
    assert_eq!(page.matches("use client").count(), 1);
    assert!(page.contains("const debug = \"디버그\";"));
    assert!(page.contains("<h1>{t(\"대시보드\")}</h1>"));
    assert!(page.contains("aria-label={t(\"증가\")}"));
    assert!(page.contains("{count}{t(\"번 클릭\")}"));

    let header = fs::read_to_string(dir.path().join("src/components/Header.tsx"))?;
    assert!(header.contains(
        "{t(\"{{user_name}}님 안녕하세요\", { user_name: user.name })}"
    ));
    assert!(header.contains("import Link from \"next/link\";"));

    let notice = fs::read_to_string(dir.path().join("src/components/Notice.tsx"))?;
    assert!(notice.contains(
        "export function Notice() {\n  const { t } = useTranslation();\n  // i18n-ignore\n  const raw = \"원본 공지\";"
    ));
    assert!(notice.contains("<p title={PATTERN}>{t(\"공지사항\")}</p>"));

    let labels = fs::read_to_string(dir.path().join("src/hooks/useLabels.ts"))?;
    assert!(labels.contains("return { save: t(\"저장\"), cancel: t(\"취소\") };"));
    Ok(())
}

#[test]
fn test_server_mode_rewrite() -> Result<()> {
    let config = Config {
        mode: Mode::Server,
        ..Config::default()
    }
    .resolve(Path::new("/project"))?;

    let rewrite = wrap_source(
        Path::new("/project/src/app/about/page.tsx"),
        "export default async function About() {\n  return <h1>소개</h1>;\n}\n".to_string(),
        &config,
    )?;

    assert_eq!(
        rewrite.output.as_deref(),
        Some(
            "import { getServerTranslation } from \"i18nexus\";\nexport default async function About() {\n  const { t } = await getServerTranslation();\n  return <h1>{t(\"소개\")}</h1>;\n}\n"
        )
    );
    Ok(())
}
