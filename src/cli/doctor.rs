//! Environment readiness check.

use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Check Chromium availability, credentials, and output-dir writability.
pub async fn run() -> Result<()> {
    println!("Cardprobe Doctor");
    println!("================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    // Chromium
    let chromium_path = find_chromium();
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or set CARDPROBE_CHROMIUM_PATH."
        ),
    }

    // Credentials (only needed for redemption)
    let has_user = std::env::var("CARDPROBE_USERNAME").is_ok();
    let has_pass = std::env::var("CARDPROBE_PASSWORD_FILE").is_ok()
        || std::env::var("CARDPROBE_PASSWORD").is_ok();
    if has_user && has_pass {
        println!("[OK] Redemption credentials configured");
    } else {
        println!("[--] No redemption credentials (fine for balance checks)");
    }

    // Output directory writability
    let cwd = std::env::current_dir()?;
    let probe = cwd.join(".cardprobe-doctor-probe");
    match std::fs::write(&probe, b"ok") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            println!("[OK] Current directory is writable: {}", cwd.display());
        }
        Err(e) => println!("[!!] Current directory not writable: {e}"),
    }

    println!();
    if chromium_path.is_some() {
        println!("Ready. Try: cardprobe check <CODE> --region cn");
    } else {
        println!("Not ready: install Chromium first.");
    }

    Ok(())
}
