use std::path::Path;
use log::{info};
use crate::error::AppErr;

pub fn set_wallpaper(image_path: &Path) -> Result<(), AppErr> {
    // Registry keys control how the image is scaled (10 = fill)
    info!("Setting Windows desktop wallpaper registry keys");

    use winreg::enums::{HKEY_CURRENT_USER, KEY_WRITE};
    use winreg::RegKey;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let key_desktop = hkcu.open_subkey_with_flags("Control Panel\\Desktop", KEY_WRITE)?;
    key_desktop.set_value("Wallpaper", &image_path.as_os_str())?;
    key_desktop.set_value("WallpaperStyle", &"10")?;
    key_desktop.set_value("TileWallpaper", &"0")?;

    info!("Submitting wallpaper through the user32 API");

    use winapi::um::winnt::PVOID;
    use winapi::um::winuser::{
        SystemParametersInfoW, SPIF_SENDCHANGE, SPIF_UPDATEINIFILE, SPI_SETDESKWALLPAPER,
    };

    let wide_path = os_str_to_wchar(image_path.as_os_str());
    let applied = unsafe {
        SystemParametersInfoW(
            SPI_SETDESKWALLPAPER,
            0,
            wide_path.as_ptr() as PVOID,
            SPIF_UPDATEINIFILE | SPIF_SENDCHANGE,
        )
    };
    if applied == 0 {
        return Err(AppErr::new("wallpaper", "SystemParametersInfoW rejected the wallpaper"));
    }

    Ok(())
}

fn os_str_to_wchar(oss: &std::ffi::OsStr) -> Vec<u16> {
    use std::iter::once;
    use std::os::windows::ffi::OsStrExt;
    // NUL-terminated unicode string
    oss.encode_wide().chain(once(0)).collect()
}
