//! CLI probe for the ordering core.
//!
//! # Responsibility
//! - Verify `board_order_core` linkage with deterministic output.
//! - Optionally open a configured database and print density audits for
//!   one workspace.
//!
//! Usage: `board_order_cli [<config.toml> <workspace_id>]`

use board_order_core::{init_from_config, BoardService, EngineConfig, WorkspaceId};
use log::info;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("board_order_core ping={}", board_order_core::ping());
    println!("board_order_core version={}", board_order_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => ExitCode::SUCCESS,
        [config_path, workspace] => match audit(config_path, workspace) {
            Ok(dense) if dense => ExitCode::SUCCESS,
            Ok(_) => ExitCode::from(2),
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: board_order_cli [<config.toml> <workspace_id>]");
            ExitCode::FAILURE
        }
    }
}

/// Prints workspace and per-column audits. Returns whether every scope is dense.
fn audit(config_path: &str, workspace: &str) -> Result<bool, Box<dyn Error>> {
    let workspace_id: WorkspaceId = workspace.parse()?;
    let config = EngineConfig::load(config_path)?;
    init_from_config(&config)?;

    let service = BoardService::open(&config)?;
    let workspace_report = service.audit_workspace(workspace_id)?;
    println!(
        "workspace={} columns={} dense={}",
        workspace_id,
        workspace_report.active,
        workspace_report.is_dense()
    );

    let mut dense = workspace_report.is_dense();
    for column in service.list_containers(workspace_id)? {
        let report = service.audit_container(column.id)?;
        println!(
            "column={} name={:?} position={} items={} dense={} gaps={:?} duplicates={:?}",
            column.id,
            column.name,
            column.position,
            report.active,
            report.is_dense(),
            report.gaps,
            report.duplicates
        );
        dense &= report.is_dense();
    }

    info!(
        "event=cli_audit module=cli status=ok workspace={} dense={}",
        workspace_id, dense
    );
    Ok(dense)
}
