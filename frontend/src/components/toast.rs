use gloo_timers::callback::Timeout;
use leptos::prelude::*;

/// 通知显示时长
const TOAST_DURATION_MS: u32 = 3_000;

#[derive(Debug, Clone, PartialEq)]
struct Toast {
    id: u64,
    message: String,
    is_error: bool,
}

/// 右上角通知，3 秒后自动消失
#[derive(Clone, Copy)]
pub struct Toasts {
    current: RwSignal<Option<Toast>>,
    next_id: RwSignal<u64>,
}

impl Toasts {
    fn new() -> Self {
        Self {
            current: RwSignal::new(None),
            next_id: RwSignal::new(0),
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message.into(), false);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message.into(), true);
    }

    fn show(&self, message: String, is_error: bool) {
        let id = self.next_id.get_untracked() + 1;
        self.next_id.set(id);
        self.current.set(Some(Toast {
            id,
            message,
            is_error,
        }));

        // 只清除自己，不影响之后弹出的通知
        let current = self.current;
        Timeout::new(TOAST_DURATION_MS, move || {
            if current.try_get_untracked().flatten().is_some_and(|t| t.id == id) {
                let _ = current.try_set(None);
            }
        })
        .forget();
    }
}

pub fn provide_toasts() {
    provide_context(Toasts::new());
}

pub fn use_toasts() -> Toasts {
    use_context::<Toasts>().expect("Toasts should be provided")
}

#[component]
pub fn ToastHost() -> impl IntoView {
    let toasts = use_toasts();

    move || {
        toasts.current.get().map(|toast| {
            let class = if toast.is_error {
                "alert alert-error shadow-lg"
            } else {
                "alert alert-success shadow-lg"
            };
            view! {
                <div class="toast toast-top toast-end z-50">
                    <div class=class>
                        <span>{toast.message}</span>
                    </div>
                </div>
            }
        })
    }
}
