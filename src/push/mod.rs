//! The `push` command group.
//!
//! Each provider module uploads an image to the provider's object storage
//! and registers it as a bootable machine image.

pub mod alibabacloud;

use crate::cli::PushProvider;
use crate::config::Endpoints;
use crate::error::PushError;

/// Run the selected provider's push.
pub async fn run(provider: PushProvider, endpoints: Endpoints) -> Result<(), PushError> {
    match provider {
        PushProvider::AlibabaCloud(args) => {
            let config = args.into_config(endpoints)?;
            let image = alibabacloud::push_alibabacloud(&config).await?;
            println!("{}", image.image_id);
            Ok(())
        }
    }
}
