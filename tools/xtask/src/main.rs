//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 tween-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `scenario-check`: 检查场景文件（格式、对象、属性、曲线名）
//! - `curve-table`: 输出所有曲线的采样表

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use tween_host::{Scenario, ScenarioError};
use tween_runtime::{Curve, lerp_unclamped};
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    match cmd.status() {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "tween-runtime", "--html"]);
            run("cargo llvm-cov -p tween-runtime --html", &mut cov)?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;

            // 排除 xtask，避免稀释信号
            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "--workspace", "--exclude", "xtask", "--html"]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "scenario-check" => {
            let path = args.next();
            scenario_check(path.as_deref())?;
        }
        "curve-table" => {
            let samples = match args.next() {
                Some(s) => s.parse()?,
                None => 5,
            };
            print_curve_table(samples)?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 tween-runtime 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  scenario-check  检查场景文件
  curve-table     输出曲线采样表

SCENARIO-CHECK:
  cargo xtask scenario-check [path]

  不带参数：检查 tween-host/scenarios/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 格式与步骤类型
    - 引用的对象是否声明、属性是否存在
    - 曲线名、时长、速度、触发时间是否有效

CURVE-TABLE:
  cargo xtask curve-table [samples]

  对 31 条曲线在 [0, 1] 上等距采样（默认 5 个点）

ALIASES (in .cargo/config.toml):
  cargo xtask     -> cargo run -p xtask --
"#
    );
}

//=============================================================================
// scenario-check 命令实现
//=============================================================================

const DEFAULT_SCENARIOS_DIR: &str = "tween-host/scenarios";

/// 执行场景检查
fn scenario_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_scenario_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_SCENARIOS_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认场景目录不存在: {}\n请在 workspace 根目录运行，或指定场景路径",
                    dir.display()
                );
            }
            collect_scenario_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到场景文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个场景文件...\n", files.len());

    let mut errors = 0;
    for file in &files {
        match check_scenario_file(file) {
            Ok(steps) => eprintln!("[OK] {}: {} 个步骤", file.display(), steps),
            Err(e) => {
                eprintln!("[ERROR] {}: {}", file.display(), e);
                errors += 1;
            }
        }
    }

    eprintln!("─────────────────────────────────────────────────────");
    if errors > 0 {
        eprintln!("❌ {} 个场景有错误", errors);
        anyhow::bail!("场景检查发现错误");
    }
    eprintln!("✅ 检查通过，无错误");
    Ok(())
}

/// 收集目录下的所有场景文件
fn collect_scenario_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个场景文件，返回步骤数
fn check_scenario_file(file: &Path) -> Result<usize, ScenarioError> {
    let scenario = Scenario::load(file)?;
    scenario.validate()?;
    Ok(scenario.steps.len())
}

//=============================================================================
// curve-table 命令实现
//=============================================================================

fn print_curve_table(samples: usize) -> anyhow::Result<()> {
    if samples < 2 {
        anyhow::bail!("采样点数至少为 2，当前为 {samples}");
    }

    let xs: Vec<f32> = (0..samples)
        .map(|i| lerp_unclamped(0.0, 1.0, i as f32 / (samples - 1) as f32))
        .collect();

    let header: Vec<String> = xs.iter().map(|x| format!("{x:>8.3}")).collect();
    println!("{:<18}{}", "curve", header.join(""));

    for curve in Curve::ALL {
        let row: Vec<String> = xs
            .iter()
            .map(|&x| format!("{:>8.3}", curve.evaluate(x)))
            .collect();
        println!("{:<18}{}", curve.to_string(), row.join(""));
    }
    Ok(())
}
