// src/main.rs

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use route_flattener::parser::parse_route_table;
use route_flattener::resolver::resolve_router_files;
use route_flattener::{find_virtual, flatten_with_report, Result, RouteNode, RouteTable};

/// CLI 引数定義
#[derive(Parser, Debug)]
#[command(
    name = "route-flattener",
    version,
    about = "ルーター定義から仮想ルートを取り除き、子ルートを親の位置に展開して JSON 出力する CLI ツール"
)]
struct Cli {
    /// ルート配列を含む JSON ファイル。`-` または省略時は標準入力
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// JSON の代わりにプロジェクト内のルーター定義ファイル (router.ts など) を解析する
    /// 例: `--project-root ./my-vue-app`
    #[arg(short = 'r', long = "project-root", value_name = "DIR", conflicts_with = "input")]
    project_root: Option<PathBuf>,

    /// 出力せず、仮想ルートが残っていれば終了コード 1 を返す
    #[arg(long)]
    check: bool,

    /// 1 行の JSON で出力する
    #[arg(long)]
    compact: bool,

    /// デバッグログを有効にする
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ログは stderr へ。RUST_LOG があればそちらを優先
    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    match &cli.project_root {
        Some(root) => run_project(cli, root),
        None => run_json(cli),
    }
}

/// JSON のルート配列を平坦化する
fn run_json(cli: &Cli) -> Result<ExitCode> {
    let routes: Vec<RouteNode> = match &cli.input {
        Some(path) if path.as_os_str() != "-" => {
            let reader = BufReader::new(File::open(path)?);
            serde_json::from_reader(reader)?
        }
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            serde_json::from_str(&buf)?
        }
    };

    if cli.check {
        return Ok(if has_virtual_routes("<input>", &routes) {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let (flattened, report) = flatten_with_report(routes);
    info!("仮想ルートを {} 件展開しました", report.collapsed.len());
    write_json(&flattened, cli.compact)?;
    Ok(ExitCode::SUCCESS)
}

/// プロジェクト内のルーター定義ファイルを探して平坦化する
fn run_project(cli: &Cli, root: &Path) -> Result<ExitCode> {
    let files = resolve_router_files(root)?;
    if files.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("ルーター定義ファイルが見つかりませんでした: {}", root.display()),
        )
        .into());
    }

    let mut tables: Vec<RouteTable> = Vec::new();
    for file in &files {
        info!("解析中: {}", file.display());
        let table = parse_route_table(file)?;
        if table.routes.is_empty() {
            info!("ルート定義なし: {}", file.display());
            continue;
        }
        tables.push(table);
    }

    if cli.check {
        let mut found = false;
        for table in &tables {
            let label = table.source_file.display().to_string();
            found |= has_virtual_routes(&label, &table.routes);
        }
        return Ok(if found { ExitCode::FAILURE } else { ExitCode::SUCCESS });
    }

    let tables: Vec<RouteTable> = tables
        .into_iter()
        .map(|table| {
            let (routes, report) = flatten_with_report(table.routes);
            info!(
                "{}: 仮想ルートを {} 件展開しました",
                table.source_file.display(),
                report.collapsed.len()
            );
            RouteTable {
                source_file: table.source_file,
                routes,
            }
        })
        .collect();

    write_json(&tables, cli.compact)?;
    Ok(ExitCode::SUCCESS)
}

/// 仮想ルートが含まれているか確認し、見つかったものをすべてログに出す
fn has_virtual_routes(label: &str, routes: &[RouteNode]) -> bool {
    if find_virtual(routes).is_none() {
        return false;
    }
    let (_, report) = flatten_with_report(routes.to_vec());
    for path in &report.collapsed {
        warn!("{label}: 仮想ルート '{path}'");
    }
    true
}

fn write_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}
