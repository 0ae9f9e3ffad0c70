use crate::chat::status::Status;
use crate::chat::{ImagePayload, MessageId, Transcript};
use crate::client::BellaClient;
use crate::config::{join_url, AppConfig};
use crate::event::{AppEvent, RequestKind};
use crate::ontology::focus::focus_entities;
use crate::theme::Theme;
use crate::ui::composer::{Composer, Submission};
use crate::ui::graph::OntologyView;
use crate::ui::messages::{message_list, ImageCache, MessageAction};
use crate::ui::status::status_indicator;
use egui::{RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Where a finished request leaves the transcript and status line.
#[derive(Debug, Default)]
pub struct ChatState {
    pub transcript: Transcript,
    pub status: Status,
    pub in_flight: usize,
    pub focused_entities: Vec<String>,
}

impl ChatState {
    pub fn begin(&mut self, status: Status) {
        self.in_flight += 1;
        self.status = status;
    }

    pub fn finish(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ChatReplied { reply, gallery } => {
                self.transcript.push_bella(reply.clone(), gallery.clone());
                self.settle(Status::Online);
            }
            AppEvent::ImageAnalyzed(analysis) => {
                self.transcript.push_bella(analysis.clone(), Vec::new());
                self.settle(Status::Online);
            }
            AppEvent::RequestFailed { message, .. } => {
                self.transcript.push_bella(message.clone(), Vec::new());
                self.settle(Status::Error);
            }
            AppEvent::OntologyLoaded(_) | AppEvent::OntologyFailed(_) => {}
        }
    }

    fn settle(&mut self, outcome: Status) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if outcome == Status::Error {
            self.status = Status::Error;
        } else if self.in_flight == 0 {
            self.status = outcome;
        }
    }
}

/// Which backend call a submission turns into.
#[derive(Debug, Clone, PartialEq)]
enum Outgoing {
    Chat { text: String, entities: Vec<String> },
    Analyze { image: ImagePayload, prompt: String },
}

fn route_submission(
    text: &str,
    image: Option<ImagePayload>,
    entities: &[String],
    show_ontology: bool,
    default_prompt: &str,
) -> Outgoing {
    match image {
        Some(image) => {
            let prompt = if text.trim().is_empty() {
                default_prompt.to_string()
            } else {
                text.to_string()
            };
            Outgoing::Analyze { image, prompt }
        }
        None => Outgoing::Chat {
            text: text.to_string(),
            entities: if show_ontology {
                entities.to_vec()
            } else {
                Vec::new()
            },
        },
    }
}

pub struct BellaApp {
    rx: Receiver<AppEvent>,
    client: BellaClient,
    config: AppConfig,
    theme: Theme,
    chat: ChatState,
    composer: Composer,
    images: ImageCache,
    ontology: OntologyView,
    show_ontology: bool,
    preview: Option<MessageId>,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
}

impl BellaApp {
    pub fn new(ctx: &egui::Context, rx: Receiver<AppEvent>, client: BellaClient, config: AppConfig) -> Self {
        let theme = Theme::default();
        theme.apply_visuals(ctx);

        let mut app = Self {
            rx,
            client,
            show_ontology: config.show_ontology,
            config,
            theme,
            chat: ChatState::default(),
            composer: Composer::default(),
            images: ImageCache::default(),
            ontology: OntologyView::default(),
            preview: None,
            diagnostics_log: Vec::new(),
            scroll_to_bottom: true,
        };
        if app.show_ontology {
            app.load_ontology();
        }
        app
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log
            .push(format!("[{}] {}", Self::timestamp(), message.into()));
    }

    fn load_ontology(&mut self) {
        self.ontology.set_loading();
        self.client.load_ontology();
        self.log_diagnostic("loading ontology");
    }

    fn submit(&mut self, submission: Submission) {
        let Submission { text, image } = submission;

        self.chat.focused_entities = focus_entities(&text, self.ontology.graph());
        self.ontology.apply_focus(&self.chat.focused_entities);

        let outgoing = route_submission(
            &text,
            image,
            &self.chat.focused_entities,
            self.show_ontology,
            &self.config.image_prompt,
        );
        match outgoing {
            Outgoing::Analyze { image, prompt } => {
                self.client.analyze_image(&image, prompt);
                self.chat.transcript.push_user(text, Some(image));
                self.chat.begin(Status::Analyzing);
            }
            Outgoing::Chat { text, entities } => {
                tracing::debug!(focused = ?entities, "sending chat message");
                self.client.send_chat(text.clone(), entities);
                self.chat.transcript.push_user(text, None);
                self.chat.begin(Status::Thinking);
            }
        }
        self.scroll_to_bottom = true;
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match &event {
            AppEvent::OntologyLoaded(graph) => {
                self.log_diagnostic(format!(
                    "ontology loaded: {} nodes, {} links",
                    graph.nodes.len(),
                    graph.links.len()
                ));
            }
            AppEvent::OntologyFailed(message) => {
                self.log_diagnostic(format!("ontology failed: {message}"));
            }
            AppEvent::RequestFailed { kind, message } => {
                let what = match kind {
                    RequestKind::Chat => "chat",
                    RequestKind::ImageAnalysis => "image analysis",
                };
                self.log_diagnostic(format!("{what} request failed: {message}"));
            }
            AppEvent::ChatReplied { .. } | AppEvent::ImageAnalyzed(_) => {}
        }

        match event {
            AppEvent::OntologyLoaded(graph) => {
                self.ontology.set_graph(graph, &self.chat.focused_entities);
            }
            AppEvent::OntologyFailed(message) => self.ontology.set_failed(message),
            other => {
                self.chat.finish(&other);
                self.scroll_to_bottom = true;
            }
        }
    }

    fn handle_message_action(&mut self, ctx: &egui::Context, action: MessageAction) {
        match action {
            MessageAction::PreviewImage(id) => self.preview = Some(id),
            MessageAction::OpenGalleryItem(path) => {
                let url = if path.starts_with("http://") || path.starts_with("https://") {
                    path
                } else {
                    join_url(&self.config.api_base_url, &path)
                };
                ctx.open_url(egui::OpenUrl::new_tab(url));
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Bella Chat");
                ui.separator();
                status_indicator(ui, &self.theme, self.chat.status.label());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let toggled = ui
                        .toggle_value(&mut self.show_ontology, "Knowledge Graph")
                        .changed();
                    if toggled && self.show_ontology && self.ontology.needs_load() {
                        self.load_ontology();
                    }
                });
            });
        });
    }

    fn render_ontology_panel(&mut self, ctx: &egui::Context) {
        if !self.show_ontology {
            return;
        }
        egui::SidePanel::right("ontology_panel")
            .resizable(true)
            .default_width(520.0)
            .show(ctx, |ui| {
                if let Some(click) = self.ontology.show(ui, &self.theme) {
                    tracing::info!(node = %click.name, focused = click.focused, "ontology node toggled");
                    self.log_diagnostic(format!(
                        "node {} {}",
                        click.name,
                        if click.focused { "focused" } else { "unfocused" }
                    ));
                }
            });
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("composer_panel").show(ctx, |ui| {
            egui::CollapsingHeader::new("Diagnostics")
                .default_open(false)
                .show(ui, |ui| {
                    self.theme.card_frame().show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("diagnostics_log")
                            .max_height(90.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for entry in &self.diagnostics_log {
                                    ui.label(RichText::new(entry).small().monospace());
                                }
                            });
                    });
                });

            if let Some(submission) = self.composer.show(ui, &self.theme) {
                self.submit(submission);
            }
            ui.add_space(self.theme.spacing_4);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let action = message_list(
                ui,
                &self.theme,
                self.chat.transcript.messages(),
                &mut self.images,
                self.scroll_to_bottom,
            );
            self.scroll_to_bottom = false;
            if let Some(action) = action {
                self.handle_message_action(ctx, action);
            }
        });
    }

    fn render_preview(&mut self, ctx: &egui::Context) {
        let Some(id) = self.preview else {
            return;
        };
        let Some(message) = self.chat.transcript.messages().iter().find(|message| message.id == id) else {
            self.preview = None;
            return;
        };
        let Some(image) = message.image.as_ref() else {
            self.preview = None;
            return;
        };

        let mut open = true;
        let title = image.file_name.clone();
        let texture = self.images.texture(ctx, id, image).cloned();
        egui::Window::new(title)
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .show(ctx, |ui| match texture {
                Some(texture) => {
                    ui.add(egui::Image::new(&texture).shrink_to_fit());
                }
                None => {
                    ui.label("This image could not be displayed.");
                }
            });
        if !open {
            self.preview = None;
        }
    }
}

impl eframe::App for BellaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.render_top_bar(ctx);
        self.render_ontology_panel(ctx);
        self.render_center_panel(ctx);
        self.render_preview(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::{route_submission, ChatState, Outgoing};
    use crate::chat::status::Status;
    use crate::chat::{ImagePayload, ImageResult, Sender, GREETING};
    use crate::event::{AppEvent, RequestKind};

    #[test]
    fn reply_is_appended_and_status_returns_online() {
        let mut state = ChatState::default();
        state.transcript.push_user("hello", None);
        state.begin(Status::Thinking);
        assert_eq!(state.status, Status::Thinking);

        state.finish(&AppEvent::ChatReplied {
            reply: "Hi!".to_string(),
            gallery: vec![ImageResult {
                path: "images/a.jpg".to_string(),
                description: "A".to_string(),
                similarity_score: 0.5,
            }],
        });

        let texts: Vec<&str> = state.transcript.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![GREETING, "hello", "Hi!"]);
        assert_eq!(state.transcript.messages().last().map(|m| m.gallery.len()), Some(1));
        assert_eq!(state.status, Status::Online);
        assert_eq!(state.in_flight, 0);
    }

    #[test]
    fn failure_degrades_to_a_bella_bubble_and_error_status() {
        let mut state = ChatState::default();
        state.transcript.push_user("hello", None);
        state.begin(Status::Thinking);

        state.finish(&AppEvent::RequestFailed {
            kind: RequestKind::Chat,
            message: "OpenAI API key not configured.".to_string(),
        });

        let last = state.transcript.messages().last().expect("error bubble");
        assert_eq!(last.sender, Sender::Bella);
        assert_eq!(last.text, "OpenAI API key not configured.");
        assert_eq!(state.status, Status::Error);
    }

    #[test]
    fn status_stays_busy_until_every_request_settles() {
        let mut state = ChatState::default();
        state.begin(Status::Thinking);
        state.begin(Status::Analyzing);

        state.finish(&AppEvent::ImageAnalyzed("A chair.".to_string()));
        assert_eq!(state.status, Status::Analyzing);

        state.finish(&AppEvent::ChatReplied {
            reply: "Done.".to_string(),
            gallery: Vec::new(),
        });
        assert_eq!(state.status, Status::Online);
    }

    #[test]
    fn next_success_clears_an_earlier_error() {
        let mut state = ChatState::default();
        state.begin(Status::Thinking);
        state.finish(&AppEvent::RequestFailed {
            kind: RequestKind::Chat,
            message: "boom".to_string(),
        });
        state.begin(Status::Thinking);
        state.finish(&AppEvent::ChatReplied {
            reply: "ok".to_string(),
            gallery: Vec::new(),
        });
        assert_eq!(state.status, Status::Online);
    }

    const DEFAULT_PROMPT: &str = "Describe this image and what it shows.";

    fn entities() -> Vec<String> {
        vec!["Designer".to_string(), "Project".to_string()]
    }

    #[test]
    fn image_without_text_uses_the_default_prompt() {
        let image = ImagePayload::new("lobby.png", vec![1, 2, 3]);
        let outgoing = route_submission("  ", Some(image.clone()), &entities(), true, DEFAULT_PROMPT);
        assert_eq!(
            outgoing,
            Outgoing::Analyze {
                image,
                prompt: DEFAULT_PROMPT.to_string(),
            }
        );
    }

    #[test]
    fn typed_text_becomes_the_image_prompt() {
        let image = ImagePayload::new("lobby.png", vec![1, 2, 3]);
        let outgoing = route_submission("What style is this?", Some(image), &[], false, DEFAULT_PROMPT);
        assert!(matches!(outgoing, Outgoing::Analyze { prompt, .. } if prompt == "What style is this?"));
    }

    #[test]
    fn entities_are_sent_only_while_the_graph_is_shown() {
        let shown = route_submission("who designed it?", None, &entities(), true, DEFAULT_PROMPT);
        assert_eq!(
            shown,
            Outgoing::Chat {
                text: "who designed it?".to_string(),
                entities: entities(),
            }
        );

        let hidden = route_submission("who designed it?", None, &entities(), false, DEFAULT_PROMPT);
        assert_eq!(
            hidden,
            Outgoing::Chat {
                text: "who designed it?".to_string(),
                entities: Vec::new(),
            }
        );
    }
}
