//! Scan command

use anyhow::{Result, anyhow};

use greencampus::capture::{CameraSelector, DecoderCommand, LineCapture, QrCapture, ScanSession};
use greencampus::ledger::{LedgerError, MissionCompleted};

use super::{CliContext, require_session};

pub async fn scan_command(
    ctx: &CliContext,
    code: Option<String>,
    camera: Option<String>,
) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;

    if let Some(code) = code {
        let completed = campus.missions().complete_mission(&session, &code)?;
        print_completed(&completed);
        return Ok(());
    }

    let scanner = ScanSession::new(campus.missions(), session);
    match camera {
        Some(selector) => {
            let selector: CameraSelector = selector.parse().map_err(|e: String| anyhow!(e))?;
            let capture = DecoderCommand::zbarcam();
            eprintln!("Point the camera at a mission QR code (Ctrl-C to cancel)...");
            match scanner.with_camera(selector).scan_once(&capture).await? {
                Some((_, result)) => print_completed(&result?),
                None => println!("No QR code decoded."),
            }
        }
        None => {
            let capture = LineCapture::stdin();
            let completed = scan_lines(&scanner, &capture).await?;
            println!("{} mission(s) completed.", completed);
        }
    }
    Ok(())
}

async fn scan_lines(scanner: &ScanSession, capture: &dyn QrCapture) -> Result<usize> {
    let completed = scanner
        .scan_all(capture, |payload, result| match result {
            Ok(done) => print_completed(done),
            Err(e) => print_rejected(payload, e),
        })
        .await?;
    Ok(completed)
}

fn print_completed(done: &MissionCompleted) {
    println!(
        "Mission complete: {} (+{} points, total {}, {} missions)",
        done.mission_title, done.points_awarded, done.total_points, done.completed_missions
    );
}

fn print_rejected(payload: &str, e: &LedgerError) {
    eprintln!("Rejected {}: {}", payload, e);
}
