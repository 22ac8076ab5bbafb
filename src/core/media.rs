use std::path::Path;

use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::AppError;
use crate::forms::Upload;

/// 文章图片在 media 目录下的子目录
pub const POST_IMAGES_DIR: &str = "posts_images";

/// 保存上传的图片，返回相对于 media 目录的路径
pub async fn save_upload(media_dir: &Path, upload: &Upload) -> Result<String, AppError> {
    // 扩展名取自文件内容而非客户端给出的文件名
    let extension = upload.image_extension().ok_or_else(|| {
        AppError::Upload(format!("{} is not a supported image", upload.filename))
    })?;

    let dir = media_dir.join(POST_IMAGES_DIR);
    fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Upload(format!("{}: {}", dir.display(), e)))?;

    let name = format!("{}.{}", Uuid::new_v4().simple(), extension);
    let path = dir.join(&name);
    fs::write(&path, &upload.bytes)
        .await
        .map_err(|e| AppError::Upload(format!("{}: {}", path.display(), e)))?;

    info!("Saved upload {} ({} bytes)", path.display(), upload.bytes.len());
    Ok(format!("{}/{}", POST_IMAGES_DIR, name))
}

/// 删除已保存的图片，失败只记录日志
pub async fn remove(media_dir: &Path, relative: &str) {
    if relative.contains("..") {
        warn!("Refusing to remove suspicious media path: {}", relative);
        return;
    }
    let path = media_dir.join(relative);
    if let Err(e) = fs::remove_file(&path).await {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}
