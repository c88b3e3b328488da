//! Push request encoding

use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::fs::File;

use super::{DIRECTORY_NAME_FIELD, FILES_FIELD};
use crate::error::TransferError;
use crate::walker::DirectoryBatch;

/// Build the multipart body for one batch
///
/// Opens one handle per file and streams it into its own part. The handles
/// live inside the returned form and are closed when it is dropped, whether
/// or not the request succeeds.
pub async fn encode_batch(batch: &DirectoryBatch) -> Result<Form, TransferError> {
    let mut form = Form::new().text(DIRECTORY_NAME_FIELD, batch.relative_dir.encode());

    for file in &batch.files {
        let open_error = |source: std::io::Error| TransferError::OpenFile {
            path: file.path.clone(),
            source,
        };

        let handle = File::open(&file.path).await.map_err(open_error)?;
        let length = handle.metadata().await.map_err(open_error)?.len();

        let part =
            Part::stream_with_length(Body::from(handle), length).file_name(file.name.clone());
        form = form.part(FILES_FIELD, part);
    }

    Ok(form)
}
