use std::sync::Arc;

use domain::{
    NewPostingReport, NewUserReport, PostingId, PostingRepository, ReportDetail,
    ReportRepository, UserName, UserRepository,
};

use crate::{
    clock::Clock, error::ApplicationError, identity::Actor, services::load_actor,
};

pub struct ReportServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub posting_repository: Arc<dyn PostingRepository>,
    pub report_repository: Arc<dyn ReportRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct ReportService {
    deps: ReportServiceDependencies,
}

impl ReportService {
    pub fn new(deps: ReportServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn report_user(
        &self,
        actor: &Actor,
        user_name: &str,
        detail: String,
    ) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let detail = ReportDetail::parse(detail)?;
        let name = UserName::parse(user_name)?;
        let target = self
            .deps
            .user_repository
            .get_by_name(&name)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("user")))?;

        let report = self
            .deps
            .report_repository
            .create_user_report(&NewUserReport {
                user_id: target.id,
                detail,
                created_at: self.deps.clock.now(),
            })
            .await?;
        tracing::info!(report_id = %report.id, user_name = %name, "收到用户举报");
        Ok(())
    }

    pub async fn report_posting(
        &self,
        actor: &Actor,
        posting_id: PostingId,
        detail: String,
    ) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let detail = ReportDetail::parse(detail)?;
        let posting = self
            .deps
            .posting_repository
            .get_by_id(posting_id)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("posting")))?;

        let report = self
            .deps
            .report_repository
            .create_posting_report(&NewPostingReport {
                posting_id: posting.id,
                detail,
                created_at: self.deps.clock.now(),
            })
            .await?;
        tracing::info!(report_id = %report.id, posting_id = %posting.id, "收到投稿举报");
        Ok(())
    }
}
