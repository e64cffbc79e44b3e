use std::path::Path;
use std::process::Command;
use log::info;
use crate::error::AppErr;

pub fn set_wallpaper(image_path: &Path) -> Result<(), AppErr> {
    info!("Setting desktop picture through the Finder");

    let script = format!(
        "tell application \"Finder\" to set desktop picture to POSIX file \"{}\"",
        image_path.display()
    );
    let status = Command::new("osascript").arg("-e").arg(&script).status()?;
    if !status.success() {
        return Err(AppErr::new("wallpaper", "osascript exited with a failure status"));
    }

    Ok(())
}
