#![windows_subsystem = "windows"]

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use image::{DynamicImage, GenericImageView};
use log::{error, info, LevelFilter};

use crate::error::AppErr;
use crate::fetch::Download;

mod error;
mod fetch;

#[cfg(windows)]
#[path = "ffi_windows.rs"]
mod ffi;
#[cfg(target_os = "macos")]
#[path = "ffi_macos.rs"]
mod ffi;
#[cfg(all(unix, not(target_os = "macos")))]
#[path = "ffi_unix.rs"]
mod ffi;

// Address of the image applied as the wallpaper
const WALLPAPER_URL: &str = "https://scontent.fsgn5-9.fna.fbcdn.net/v/t39.30808-6/536282619_122104944854994196_5841633964594740809_n.jpg?_nc_cat=105&ccb=1-7&_nc_sid=127cfc&_nc_ohc=0u5jdDI-r7oQ7kNvwGfdkIe&_nc_oc=AdnoJPHI3a9crqaBiwHzrgCGQfzHGSld6YXjenfrM9v5eah90wzA-YLGUmDzu9558nc&_nc_zt=23&_nc_ht=scontent.fsgn5-9.fna&_nc_gid=LikPNfmANVHo94W2oobyvw&oh=00_AfaB89JitfYObtQP5F8hobrG0mkYTNLaUfVVchvnVCYZOQ&oe=68BE00E5";

const WALLPAPER_FILENAME: &str = "wallpaper.png";

// Pause between the environment preflight and the first network activity
const PREFLIGHT_SETTLE: Duration = Duration::from_secs(1);

// The process lingers briefly so the final log line can be observed
const SUCCESS_EXIT_DELAY: Duration = Duration::from_secs(2);
const FAILURE_EXIT_DELAY: Duration = Duration::from_secs(1);

fn main() {
    simple_logging::log_to_stderr(LevelFilter::Info);
    info!("Starting wallpaper update");

    match run() {
        Ok(()) => {
            info!("Wallpaper changed successfully");
            linger_and_exit(SUCCESS_EXIT_DELAY, 0);
        }
        Err(err) => {
            error!("{}", err);
            linger_and_exit(FAILURE_EXIT_DELAY, 1);
        }
    }
}

fn run() -> Result<(), AppErr> {
    let scratch_dir = scratch_dir();
    prepare_scratch_dir(&scratch_dir)?;

    thread::sleep(PREFLIGHT_SETTLE);

    info!("Downloading wallpaper from: {}", WALLPAPER_URL);
    let download = Download::start(WALLPAPER_URL.to_owned());
    let image_data = download.wait()?;
    info!("Image downloaded successfully, size: {} bytes", image_data.len());

    let bitmap = decode_bitmap(&image_data)?;

    let image_path = scratch_dir.join(WALLPAPER_FILENAME);
    info!("Writing wallpaper image to {:?}", image_path);
    bitmap.save(&image_path)?;

    ffi::set_wallpaper(&image_path)
}

fn decode_bitmap(image_data: &[u8]) -> Result<DynamicImage, AppErr> {
    if image_data.is_empty() {
        return Err(AppErr::new("decode", "No image data available"));
    }
    let bitmap = image::load_from_memory(image_data)?;
    let (width, height) = bitmap.dimensions();
    info!("Bitmap created successfully: {}x{}", width, height);
    Ok(bitmap)
}

fn scratch_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("RemoteWallpaper")
}

fn prepare_scratch_dir(dir: &Path) -> Result<(), AppErr> {
    info!("Preparing scratch directory {:?}", dir);
    fs::create_dir_all(dir)?;
    if fs::metadata(dir)?.permissions().readonly() {
        return Err(AppErr::new(
            "preflight",
            &format!("Scratch directory {:?} is not writable", dir),
        ));
    }
    Ok(())
}

fn linger_and_exit(delay: Duration, code: i32) -> ! {
    info!("Exiting...");
    thread::sleep(delay);
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let bitmap = DynamicImage::new_rgb8(width, height);
        let mut buffer = Vec::new();
        bitmap
            .write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn decode_accepts_a_complete_image() {
        let bytes = encode_png(4, 2);
        let bitmap = decode_bitmap(&bytes).unwrap();
        assert_eq!(bitmap.dimensions(), (4, 2));
    }

    #[test]
    fn decode_rejects_an_empty_buffer() {
        let err = decode_bitmap(&[]).unwrap_err();
        assert!(format!("{}", err).contains("No image data"));
    }

    #[test]
    fn decode_rejects_junk_bytes() {
        assert!(decode_bitmap(b"not an image").is_err());
    }

    #[test]
    fn scratch_dir_is_namespaced() {
        assert!(scratch_dir().ends_with("RemoteWallpaper"));
    }
}
