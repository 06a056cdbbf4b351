//! Sequential generation runs.
//!
//! Each dataset is described, rendered, created and published before the
//! next one starts. The first error aborts the run.

use std::io::Write;

use rand::Rng;
use tracing::info;

use crate::api::DataverseApi;
use crate::descriptor::{DatasetVariant, RunContext};
use crate::error::{PublishError, RunError};
use crate::payload::PayloadRenderer;
use crate::publisher::DatasetPublisher;

/// What to generate in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Generator variant.
    pub variant: DatasetVariant,
    /// Collection alias datasets are created in.
    pub parent: String,
    /// Number of datasets to generate.
    pub count: usize,
}

/// Generates, creates and publishes `settings.count` datasets in order.
///
/// Writes `Id: {id} PID: {pid}` after each creation and the publish response
/// after each publication to `out`. When the server rejects a creation, its
/// raw response body is written to `out` before the error is returned.
/// Returns the number of datasets published.
///
/// # Errors
///
/// Returns [`RunError`] on the first sampling, rendering, API or output
/// failure.
pub async fn publish_datasets<A, R, W>(
    settings: &RunSettings,
    context: &RunContext,
    renderer: &PayloadRenderer,
    publisher: &DatasetPublisher<A>,
    rng: &mut R,
    out: &mut W,
) -> Result<usize, RunError>
where
    A: DataverseApi,
    R: Rng + ?Sized,
    W: Write + ?Sized,
{
    for index in 0..settings.count {
        let descriptor = settings.variant.describe(rng, context, index)?;
        let payload = renderer.render(&descriptor)?;
        info!(index, title = %descriptor.title, "dataset rendered");

        let created = match publisher.create(&settings.parent, &payload).await {
            Ok(created) => created,
            Err(err) => return Err(surface_rejection(err, out)),
        };
        writeln!(out, "Id: {} PID: {}", created.id, created.persistent_id)?;

        let result = publisher.publish(&created.persistent_id).await?;
        writeln!(out, "{}", result.response)?;
    }

    Ok(settings.count)
}

/// Renders `settings.count` payloads and writes them to `out` without
/// contacting a server.
///
/// Draws from `rng` exactly as [`publish_datasets`] does, so a seeded dry run
/// previews the datasets a seeded live run would create.
///
/// # Errors
///
/// Returns [`RunError`] on the first sampling, rendering or output failure.
pub fn render_datasets<R, W>(
    settings: &RunSettings,
    context: &RunContext,
    renderer: &PayloadRenderer,
    rng: &mut R,
    out: &mut W,
) -> Result<usize, RunError>
where
    R: Rng + ?Sized,
    W: Write + ?Sized,
{
    for index in 0..settings.count {
        let descriptor = settings.variant.describe(rng, context, index)?;
        let payload = renderer.render(&descriptor)?;
        writeln!(out, "{payload}")?;
    }
    Ok(settings.count)
}

/// Writes a rejected creation's raw body to `out` and converts the error.
fn surface_rejection<W>(err: PublishError, out: &mut W) -> RunError
where
    W: Write + ?Sized,
{
    if let Some(body) = err.remote_body() {
        if let Err(write_err) = writeln!(out, "{body}") {
            return RunError::from(write_err);
        }
    }
    RunError::from(err)
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use mockall::predicate::{always, eq};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::api::{CreatedDataset, MockDataverseApi, PublishResult};

    #[fixture]
    fn context() -> RunContext {
        RunContext::new(Uuid::nil(), "20240101120000".to_owned())
    }

    fn settings(variant: DatasetVariant, count: usize) -> RunSettings {
        RunSettings {
            variant,
            parent: variant.default_parent().to_owned(),
            count,
        }
    }

    fn created(n: u64) -> CreatedDataset {
        CreatedDataset {
            id: n,
            persistent_id: format!("doi:10.5072/FK2/{n}"),
        }
    }

    fn published(pid: &str) -> PublishResult {
        PublishResult {
            id: Some(1),
            persistent_id: pid.to_owned(),
            status: "OK".to_owned(),
            response: json!({"status": "OK"}),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn create_rejection_aborts_after_surfacing_body(context: RunContext) {
        let mut api = MockDataverseApi::new();
        api.expect_create_dataset().times(1).returning(|_, _| {
            Err(PublishError::Remote {
                operation: "create",
                status: 400,
                body: r#"{"message":"bad request"}"#.to_owned(),
            })
        });
        api.expect_publish_dataset().never();
        let publisher = DatasetPublisher::new(api);
        let mut out = Vec::new();

        let result = publish_datasets(
            &settings(DatasetVariant::Archaeology, 3),
            &context,
            &PayloadRenderer::default(),
            &publisher,
            &mut ChaCha8Rng::seed_from_u64(1),
            &mut out,
        )
        .await;

        assert!(matches!(
            result,
            Err(RunError::Publish(PublishError::Remote { status: 400, .. }))
        ));
        assert_eq!(
            String::from_utf8(out).expect("utf-8 output"),
            "{\"message\":\"bad request\"}\n"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn huge_count_aborts_on_first_rejection(context: RunContext) {
        let mut api = MockDataverseApi::new();
        api.expect_create_dataset().times(1).returning(|_, _| {
            Err(PublishError::Remote {
                operation: "create",
                status: 400,
                body: "rejected".to_owned(),
            })
        });
        api.expect_publish_dataset().never();
        let publisher = DatasetPublisher::new(api);
        let mut out = Vec::new();

        let result = publish_datasets(
            &settings(DatasetVariant::Archaeology, usize::MAX / 2),
            &context,
            &PayloadRenderer::default(),
            &publisher,
            &mut ChaCha8Rng::seed_from_u64(3),
            &mut out,
        )
        .await;

        assert!(matches!(
            result,
            Err(RunError::Publish(PublishError::Remote { status: 400, .. }))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn datasets_are_created_then_published_in_order(context: RunContext) {
        let mut api = MockDataverseApi::new();
        let mut sequence = Sequence::new();
        for n in 1..=2 {
            api.expect_create_dataset()
                .with(eq("dccd"), always())
                .times(1)
                .in_sequence(&mut sequence)
                .returning(move |_, _| Ok(created(n)));
            api.expect_publish_dataset()
                .with(eq(format!("doi:10.5072/FK2/{n}")))
                .times(1)
                .in_sequence(&mut sequence)
                .returning(|pid| Ok(published(pid)));
        }
        let publisher = DatasetPublisher::new(api);
        let mut out = Vec::new();

        let published = publish_datasets(
            &settings(DatasetVariant::Dccd, 2),
            &context,
            &PayloadRenderer::default(),
            &publisher,
            &mut ChaCha8Rng::seed_from_u64(1),
            &mut out,
        )
        .await
        .expect("run succeeds");

        assert_eq!(published, 2);
        let text = String::from_utf8(out).expect("utf-8 output");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Id: 1 PID: doi:10.5072/FK2/1",
                r#"{"status":"OK"}"#,
                "Id: 2 PID: doi:10.5072/FK2/2",
                r#"{"status":"OK"}"#,
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn publish_failure_aborts_remaining_datasets(context: RunContext) {
        let mut api = MockDataverseApi::new();
        api.expect_create_dataset()
            .times(1)
            .returning(|_, _| Ok(created(9)));
        api.expect_publish_dataset().times(1).returning(|_| {
            Err(PublishError::Remote {
                operation: "publish",
                status: 409,
                body: "conflict".to_owned(),
            })
        });
        let publisher = DatasetPublisher::new(api);
        let mut out = Vec::new();

        let result = publish_datasets(
            &settings(DatasetVariant::Archaeology, 5),
            &context,
            &PayloadRenderer::default(),
            &publisher,
            &mut ChaCha8Rng::seed_from_u64(2),
            &mut out,
        )
        .await;

        assert!(matches!(
            result,
            Err(RunError::Publish(PublishError::Remote { status: 409, .. }))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn zero_count_issues_no_requests(context: RunContext) {
        let mut api = MockDataverseApi::new();
        api.expect_create_dataset().never();
        api.expect_publish_dataset().never();
        let publisher = DatasetPublisher::new(api);
        let mut out = Vec::new();

        let published = publish_datasets(
            &settings(DatasetVariant::Archaeology, 0),
            &context,
            &PayloadRenderer::default(),
            &publisher,
            &mut ChaCha8Rng::seed_from_u64(2),
            &mut out,
        )
        .await
        .expect("empty run succeeds");

        assert_eq!(published, 0);
        assert!(out.is_empty());
    }

    #[rstest]
    fn dry_run_is_reproducible_for_a_seed(context: RunContext) {
        let render = || {
            let mut out = Vec::new();
            render_datasets(
                &settings(DatasetVariant::Archaeology, 4),
                &context,
                &PayloadRenderer::default(),
                &mut ChaCha8Rng::seed_from_u64(77),
                &mut out,
            )
            .expect("dry run succeeds");
            String::from_utf8(out).expect("utf-8 output")
        };

        let first = render();
        assert_eq!(first, render());
        assert_eq!(first.matches("\"datasetVersion\"").count(), 4);
    }
}
