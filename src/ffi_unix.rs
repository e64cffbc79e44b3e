use std::path::Path;
use log::warn;
use crate::error::AppErr;

pub fn set_wallpaper(image_path: &Path) -> Result<(), AppErr> {
    warn!(
        "Wallpaper change is not supported on this platform; image left at {}",
        image_path.display()
    );
    Ok(())
}
