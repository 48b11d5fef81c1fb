//! 通用列表 + 弹窗页面控制器
//!
//! 所有资源页共享同一个状态机：挂载时拉取列表，弹窗承载创建 / 编辑 / 查看 / 删除确认。
//! 每个写操作依次经过：能力检查 -> 本地校验 -> 请求 -> 重新拉取列表。
//! 前两步失败时不发出任何请求。

use crate::error::{AdminError, AdminErrorStatus, AdminResult};
use crate::services::ResourceService;
use crate::watch::{StateCell, Subscription};
use siteadmin_shared::{Action, DraftMode, Permissions, Record, ResourceCaps, Validate};
use std::cell::{Cell, RefCell};
use tracing::{debug, info, warn};

/// 后端返回 403 但没有给出消息时的提示
pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action";

#[derive(Debug, Clone, PartialEq)]
pub enum Modal<T> {
    Create,
    Edit(T),
    View(T),
    DeleteConfirm(T),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageState<T> {
    Loading,
    Ready {
        items: Vec<T>,
        modal: Option<Modal<T>>,
        /// 行内错误提示
        error: Option<String>,
        /// 有写操作正在进行
        busy: bool,
    },
    Failed {
        message: String,
    },
}

impl<T> PageState<T> {
    fn ready(items: Vec<T>) -> Self {
        PageState::Ready {
            items,
            modal: None,
            error: None,
            busy: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PageState::Loading)
    }

    /// 失败状态下视为空列表
    pub fn items(&self) -> &[T] {
        match self {
            PageState::Ready { items, .. } => items,
            _ => &[],
        }
    }

    pub fn modal(&self) -> Option<&Modal<T>> {
        match self {
            PageState::Ready { modal, .. } => modal.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PageState::Ready { error, .. } => error.as_deref(),
            PageState::Failed { message } => Some(message),
            PageState::Loading => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, PageState::Ready { busy: true, .. })
    }
}

fn verb(action: Action) -> &'static str {
    match action {
        Action::View => "view",
        Action::Create => "create",
        Action::Update => "edit",
        Action::Delete => "delete",
        Action::Toggle => "update the status of",
    }
}

/// 面向用户的错误消息
fn user_message(err: &AdminError) -> String {
    match (err.status, err.server_message()) {
        (_, Some(message)) => message.to_string(),
        (AdminErrorStatus::Forbidden, None) => PERMISSION_DENIED_MESSAGE.to_string(),
        _ => err.message().to_string(),
    }
}

pub struct CrudController<S: ResourceService> {
    service: S,
    permissions: Permissions,
    state: StateCell<PageState<S::Item>>,
    /// 列表请求的代次，过期结果直接丢弃
    generation: Cell<u64>,
    detached: Cell<bool>,
    on_unauthorized: RefCell<Option<Box<dyn Fn()>>>,
}

impl<S: ResourceService> CrudController<S> {
    pub fn new(service: S, permissions: Permissions) -> Self {
        Self {
            service,
            permissions,
            state: StateCell::new(PageState::Loading),
            generation: Cell::new(0),
            detached: Cell::new(false),
            on_unauthorized: RefCell::new(None),
        }
    }

    pub fn state(&self) -> PageState<S::Item> {
        self.state.get()
    }

    pub fn caps(&self) -> ResourceCaps {
        self.permissions.caps(S::KIND)
    }

    pub fn subscribe(&self, listener: impl Fn(&PageState<S::Item>) + 'static) -> Subscription {
        self.state.subscribe(listener)
    }

    /// 任一请求返回 401 时调用一次，通常用来清空会话
    pub fn on_unauthorized(&self, hook: impl Fn() + 'static) {
        *self.on_unauthorized.borrow_mut() = Some(Box::new(hook));
    }

    fn check_auth(&self, err: &AdminError) {
        if !err.is_auth_failure() || self.detached.get() {
            return;
        }
        // 先取出再调用，回调里可能卸载页面
        let hook = self.on_unauthorized.borrow_mut().take();
        if let Some(hook) = hook {
            info!(resource = S::KIND.title(), "token rejected, ending session");
            hook();
        }
    }

    /// 页面卸载：之后到达的响应不再通知任何人
    pub fn detach(&self) {
        self.detached.set(true);
        self.state.clear_listeners();
    }

    fn update(&self, f: impl FnOnce(&mut PageState<S::Item>)) {
        if !self.detached.get() {
            self.state.update(f);
        }
    }

    /// 只在 Ready 状态下修改
    fn update_ready(
        &self,
        f: impl FnOnce(&mut Vec<S::Item>, &mut Option<Modal<S::Item>>, &mut Option<String>, &mut bool),
    ) {
        self.update(|s| {
            if let PageState::Ready {
                items,
                modal,
                error,
                busy,
            } = s
            {
                f(items, modal, error, busy);
            }
        });
    }

    fn set_error(&self, message: String) {
        self.update_ready(|_, _, error, _| *error = Some(message));
    }

    fn find(&self, id: &str) -> Option<S::Item> {
        self.state
            .with(|s| s.items().iter().find(|item| item.id() == id).cloned())
    }

    /// 能力检查；未授权时写入行内错误
    fn authorize(&self, action: Action) -> AdminResult<()> {
        if self.permissions.allows(S::KIND, action) {
            return Ok(());
        }
        let err = AdminError::forbidden(format!(
            "You do not have permission to {} {}",
            verb(action),
            S::KIND.title().to_lowercase()
        ))
        .in_op_with("crud.authorize", S::KIND.title());
        debug!(resource = S::KIND.title(), ?action, "action denied locally");
        self.set_error(err.message.clone());
        Err(err)
    }

    // =========================================================
    // 列表
    // =========================================================

    /// 挂载时拉取；失败进入 Failed，只能通过再次调用恢复
    pub async fn load(&self) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.update(|s| *s = PageState::Loading);

        let result = self.service.list().await;
        if self.generation.get() != generation {
            return;
        }
        match result {
            Ok(items) => {
                debug!(resource = S::KIND.title(), count = items.len(), "list loaded");
                self.update(|s| *s = PageState::ready(items));
            }
            Err(e) => {
                warn!(resource = S::KIND.title(), error = %e, "list failed");
                let message = user_message(&e);
                self.update(|s| *s = PageState::Failed { message });
                self.check_auth(&e);
            }
        }
    }

    /// 写操作成功后的重新拉取：失败时保留原列表并给出行内错误
    async fn refresh(&self) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let result = self.service.list().await;
        if self.generation.get() != generation {
            return;
        }
        match result {
            Ok(fresh) => self.update_ready(|items, _, _, _| *items = fresh),
            Err(e) => {
                warn!(resource = S::KIND.title(), error = %e, "refresh failed");
                self.set_error(user_message(&e));
                self.check_auth(&e);
            }
        }
    }

    // =========================================================
    // 弹窗
    // =========================================================

    pub fn open_create(&self) -> AdminResult<()> {
        self.authorize(Action::Create)?;
        self.update_ready(|_, modal, error, _| {
            *modal = Some(Modal::Create);
            *error = None;
        });
        Ok(())
    }

    pub fn open_edit(&self, id: &str) -> AdminResult<()> {
        self.authorize(Action::Update)?;
        self.open_with(id, Modal::Edit)
    }

    pub fn open_view(&self, id: &str) -> AdminResult<()> {
        self.open_with(id, Modal::View)
    }

    pub fn request_delete(&self, id: &str) -> AdminResult<()> {
        self.authorize(Action::Delete)?;
        self.open_with(id, Modal::DeleteConfirm)
    }

    fn open_with(&self, id: &str, make: fn(S::Item) -> Modal<S::Item>) -> AdminResult<()> {
        let item = self.find(id).ok_or_else(|| {
            AdminError::new(AdminErrorStatus::NotFound, format!("No record with id {id}"))
                .in_op("crud.open")
        })?;
        self.update_ready(|_, modal, error, _| {
            *modal = Some(make(item));
            *error = None;
        });
        Ok(())
    }

    /// 编辑弹窗的初始表单
    pub fn draft(&self) -> S::Draft {
        self.state.with(|s| match s.modal() {
            Some(Modal::Edit(item)) => S::draft_for(item),
            _ => S::Draft::default(),
        })
    }

    pub fn cancel(&self) {
        self.update_ready(|_, modal, error, _| {
            *modal = None;
            *error = None;
        });
    }

    /// 关闭行内错误；拉取失败后关闭则显示空列表
    pub fn dismiss_error(&self) {
        self.update(|s| match s {
            PageState::Ready { error, .. } => *error = None,
            PageState::Failed { .. } => *s = PageState::ready(Vec::new()),
            PageState::Loading => {}
        });
    }

    // =========================================================
    // 写操作
    // =========================================================

    /// 提交创建 / 编辑弹窗
    ///
    /// 失败时弹窗保持打开，服务端消息原样展示。
    pub async fn submit(&self, draft: S::Draft) -> AdminResult<()> {
        let target = self.state.with(|s| match s.modal() {
            Some(Modal::Create) => Some(None),
            Some(Modal::Edit(item)) => Some(Some(item.id().to_string())),
            _ => None,
        });
        let Some(target) = target else {
            return Err(AdminError::validation("Nothing to submit").in_op("crud.submit"));
        };

        let (action, mode) = match target {
            None => (Action::Create, DraftMode::Create),
            Some(_) => (Action::Update, DraftMode::Update),
        };
        self.authorize(action)?;

        if let Err(errors) = draft.validate(mode) {
            let err = AdminError::from(errors).in_op("crud.submit");
            self.set_error(err.message.clone());
            return Err(err);
        }

        self.update_ready(|_, _, error, busy| {
            *busy = true;
            *error = None;
        });
        let result = match &target {
            None => self.service.create(&draft).await,
            Some(id) => self.service.update(id, &draft).await,
        };
        self.finish(result, action, true).await
    }

    pub async fn confirm_delete(&self) -> AdminResult<()> {
        let id = self.state.with(|s| match s.modal() {
            Some(Modal::DeleteConfirm(item)) => Some(item.id().to_string()),
            _ => None,
        });
        let Some(id) = id else {
            return Err(AdminError::validation("Nothing to delete").in_op("crud.delete"));
        };
        self.authorize(Action::Delete)?;

        self.update_ready(|_, _, error, busy| {
            *busy = true;
            *error = None;
        });
        let result = self.service.delete(&id).await;
        self.finish(result, Action::Delete, true).await
    }

    /// 审核 / 已读切换，直接在列表行上触发
    pub async fn toggle(&self, id: &str) -> AdminResult<()> {
        self.authorize(Action::Toggle)?;
        let item = self.find(id).ok_or_else(|| {
            AdminError::new(AdminErrorStatus::NotFound, format!("No record with id {id}"))
                .in_op("crud.toggle")
        })?;

        // 上一次写操作未完成时不再发出请求
        if self.state.with(PageState::is_busy) {
            return Err(AdminError::new(
                AdminErrorStatus::Conflict,
                "Another change is still in progress",
            )
            .in_op("crud.toggle"));
        }

        self.update_ready(|_, _, _, busy| *busy = true);
        let result = self.service.toggle(&item).await;
        self.finish(result, Action::Toggle, false).await
    }

    async fn finish(&self, result: AdminResult<()>, action: Action, closes_modal: bool) -> AdminResult<()> {
        match result {
            Ok(()) => {
                info!(resource = S::KIND.title(), ?action, "mutation succeeded");
                self.update_ready(|_, modal, _, busy| {
                    *busy = false;
                    if closes_modal {
                        *modal = None;
                    }
                });
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                warn!(resource = S::KIND.title(), ?action, error = %e, "mutation failed");
                let message = user_message(&e);
                self.update_ready(|_, _, error, busy| {
                    *busy = false;
                    *error = Some(message);
                });
                self.check_auth(&e);
                Err(e.in_op_with("crud.mutate", S::KIND.title()))
            }
        }
    }
}
