//! GTK4 desktop shell around [`MemeEditor`].

mod form;
mod input_bridge;
mod notification;
mod style;
mod surface;
mod worker;

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, Button, DrawingArea, FileChooserAction,
    FileChooserNative, Label, Orientation, ResponseType, ScrolledWindow,
};

use self::form::LayerForm;
use self::input_bridge::{normalize_shortcut_key, shortcut_modifiers};
use self::style::LAYOUT_TOKENS;
use self::worker::spawn_worker_action;
use crate::app::{fetch_random_template_image, MemeEditor};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::geometry::{CanvasPoint, DisplayRect};
use crate::imaging;
use crate::input::{dispatch, resolve_shortcut, EditorInput, InputContext, ShortcutAction};
use crate::state::Operation;

const APP_ID: &str = "io.github.memegen.Editor";
const WINDOW_TITLE: &str = "Meme Generator";

#[derive(Clone)]
struct Toolbar {
    upload: Button,
    random: Button,
    add_text: Button,
    export: Button,
}

#[derive(Clone)]
struct UiContext {
    editor: Rc<RefCell<MemeEditor>>,
    window: ApplicationWindow,
    canvas_area: DrawingArea,
    status_label: Label,
    layers_box: GtkBox,
    layers_empty: Label,
    toolbar: Toolbar,
    form: LayerForm,
    display_rect: Rc<Cell<DisplayRect>>,
    file_dialog: Rc<RefCell<Option<FileChooserNative>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormSync {
    Sync,
    Skip,
}

impl UiContext {
    fn refresh(&self, form_sync: FormSync) {
        self.canvas_area.queue_draw();
        let editor = self.editor.borrow();
        self.status_label.set_text(editor.status());

        let busy = editor.is_busy();
        self.toolbar.upload.set_sensitive(!busy);
        self.toolbar.random.set_sensitive(!busy);
        self.toolbar.add_text.set_sensitive(!busy);
        self.toolbar.export.set_sensitive(!busy);

        while let Some(child) = self.layers_box.first_child() {
            self.layers_box.remove(&child);
        }
        let summaries = editor.layer_summaries();
        self.layers_empty.set_visible(summaries.is_empty());
        for summary in summaries {
            let row = GtkBox::new(Orientation::Horizontal, LAYOUT_TOKENS.spacing_8);
            let names = GtkBox::new(Orientation::Vertical, 0);
            let name = Label::new(Some(&summary.label));
            name.set_xalign(0.0);
            name.set_ellipsize(gtk4::pango::EllipsizeMode::End);
            let meta = Label::new(Some(&summary.position));
            meta.set_xalign(0.0);
            meta.add_css_class("dim-label");
            names.append(&name);
            names.append(&meta);
            names.set_hexpand(true);
            let size = Label::new(Some(&summary.size));
            size.add_css_class("dim-label");
            row.append(&names);
            row.append(&size);

            let button = Button::new();
            button.set_child(Some(&row));
            button.add_css_class("flat");
            if summary.selected {
                button.add_css_class("suggested-action");
            }
            let context = self.clone();
            let id = summary.id;
            button.connect_clicked(move |_| context.apply_input(EditorInput::SelectLayer(id)));
            self.layers_box.append(&button);
        }

        if form_sync == FormSync::Sync {
            self.form.sync(editor.active_overlay());
        }
    }

    fn apply_input(&self, input: EditorInput) {
        let form_sync = match input {
            EditorInput::Edit(_) => FormSync::Skip,
            _ => FormSync::Sync,
        };
        let outcome = dispatch(&mut self.editor.borrow_mut(), input);
        if outcome.redrawn() {
            self.refresh(form_sync);
        }
    }

    fn begin(&self, operation: Operation) -> bool {
        let started = self.editor.borrow_mut().begin_operation(operation);
        if let Err(err) = started {
            tracing::debug!(%err, ?operation, "operation refused");
            return false;
        }
        self.refresh(FormSync::Skip);
        true
    }

    fn open_upload_dialog(&self) {
        let dialog = FileChooserNative::new(
            Some("Upload image"),
            Some(&self.window),
            FileChooserAction::Open,
            Some("Open"),
            Some("Cancel"),
        );
        let filter = gtk4::FileFilter::new();
        filter.set_name(Some("Images"));
        filter.add_mime_type("image/*");
        dialog.add_filter(&filter);

        let context = self.clone();
        dialog.connect_response(move |dialog, response| {
            let path = (response == ResponseType::Accept)
                .then(|| dialog.file().and_then(|file| file.path()))
                .flatten();
            context.file_dialog.borrow_mut().take();
            if let Some(path) = path {
                context.start_upload(path);
            }
        });
        dialog.show();
        *self.file_dialog.borrow_mut() = Some(dialog);
    }

    fn start_upload(&self, path: PathBuf) {
        if !self.begin(Operation::Upload) {
            return;
        }
        let max_dimension = self.editor.borrow().max_dimension();
        let context = self.clone();
        let spawned = spawn_worker_action(
            Operation::Upload,
            move || imaging::load_file(&path, max_dimension).map_err(AppError::from),
            move |result| {
                let _ = context.editor.borrow_mut().finish_upload(result);
                context.refresh(FormSync::Sync);
            },
        );
        if let Err(err) = spawned {
            let _ = self.editor.borrow_mut().finish_upload(Err(worker_error(err)));
            self.refresh(FormSync::Skip);
        }
    }

    fn start_random_template(&self) {
        if !self.begin(Operation::RandomTemplate) {
            return;
        }
        let (templates, max_dimension) = {
            let editor = self.editor.borrow();
            (editor.templates(), editor.max_dimension())
        };
        let context = self.clone();
        let spawned = spawn_worker_action(
            Operation::RandomTemplate,
            move || fetch_random_template_image(&templates, max_dimension),
            move |result| {
                let _ = context.editor.borrow_mut().finish_random_template(result);
                context.refresh(FormSync::Sync);
            },
        );
        if let Err(err) = spawned {
            let _ = self
                .editor
                .borrow_mut()
                .finish_random_template(Err(worker_error(err)));
            self.refresh(FormSync::Skip);
        }
    }

    fn start_export(&self) {
        if !self.begin(Operation::Export) {
            return;
        }
        let (pixmap, exporter) = {
            let editor = self.editor.borrow();
            (editor.canvas().pixmap().clone(), editor.exporter().clone())
        };
        let context = self.clone();
        let spawned = spawn_worker_action(
            Operation::Export,
            move || exporter.save_png(&pixmap, None).map_err(AppError::from),
            move |result| {
                let finished = context.editor.borrow_mut().finish_export(result);
                if let Ok(path) = finished {
                    notification::send_export_complete(&path);
                }
                context.refresh(FormSync::Skip);
            },
        );
        if let Err(err) = spawned {
            let _ = self.editor.borrow_mut().finish_export(Err(worker_error(err)));
            self.refresh(FormSync::Skip);
        }
    }

    fn handle_shortcut(&self, action: ShortcutAction) {
        match action {
            ShortcutAction::DeleteActive => self.apply_input(EditorInput::DeleteActive),
            ShortcutAction::ClearSelection => self.apply_input(EditorInput::ClearSelection),
            ShortcutAction::AddText => self.apply_input(EditorInput::AddText),
            ShortcutAction::Export => self.start_export(),
            ShortcutAction::Upload => self.open_upload_dialog(),
            ShortcutAction::RandomTemplate => self.start_random_template(),
        }
    }

    fn text_field_focused(&self) -> bool {
        self.window
            .focus()
            .is_some_and(|widget| widget.is::<gtk4::Text>() || widget.is::<gtk4::TextView>())
    }
}

fn worker_error(err: std::io::Error) -> AppError {
    tracing::error!(?err, "failed to spawn worker thread");
    AppError::Ui(format!("could not start background task: {err}"))
}

fn connect_canvas_draw(context: &UiContext) {
    let editor = context.editor.clone();
    let display_rect = context.display_rect.clone();
    context
        .canvas_area
        .set_draw_func(move |_, cairo_context, width, height| {
            if width <= 0 || height <= 0 {
                return;
            }
            let editor = editor.borrow();
            let canvas = editor.canvas();
            let rect = surface::fit_display_rect(canvas.size(), width, height);
            display_rect.set(rect);

            let Some(surface) = surface::pixmap_to_cairo_surface(canvas.pixmap()) else {
                tracing::warn!("failed to convert canvas to a cairo surface");
                return;
            };
            let size = canvas.size();
            cairo_context.save().ok();
            cairo_context.translate(rect.left, rect.top);
            cairo_context.scale(
                rect.width / f64::from(size.width.max(1)),
                rect.height / f64::from(size.height.max(1)),
            );
            if let Err(err) = cairo_context.set_source_surface(&surface, 0.0, 0.0) {
                tracing::warn!(?err, "failed to set canvas surface");
            } else {
                cairo_context.source().set_filter(gtk4::cairo::Filter::Good);
                cairo_context.paint().ok();
            }
            cairo_context.restore().ok();
        });
}

fn connect_canvas_gestures(context: &UiContext) {
    let gesture = gtk4::GestureDrag::new();
    gesture.set_button(gtk4::gdk::BUTTON_PRIMARY);

    let begin_context = context.clone();
    gesture.connect_drag_begin(move |_, start_x, start_y| {
        begin_context.apply_input(EditorInput::PointerDown {
            client: CanvasPoint::new(start_x, start_y),
            display: begin_context.display_rect.get(),
        });
    });

    let update_context = context.clone();
    gesture.connect_drag_update(move |gesture, offset_x, offset_y| {
        let Some((start_x, start_y)) = gesture.start_point() else {
            return;
        };
        update_context.apply_input(EditorInput::PointerMove {
            client: CanvasPoint::new(start_x + offset_x, start_y + offset_y),
            display: update_context.display_rect.get(),
        });
    });

    let end_context = context.clone();
    gesture.connect_drag_end(move |_, _, _| {
        end_context.apply_input(EditorInput::PointerUp);
    });

    let cancel_context = context.clone();
    gesture.connect_cancel(move |_, _| {
        cancel_context.apply_input(EditorInput::PointerCancel);
    });

    context.canvas_area.add_controller(gesture);
}

fn connect_shortcuts(context: &UiContext) {
    let key_controller = gtk4::EventControllerKey::new();
    let key_context = context.clone();
    key_controller.connect_key_pressed(move |_, key, keycode, modifier| {
        let Some(shortcut_key) = normalize_shortcut_key(key, keycode) else {
            return gtk4::glib::Propagation::Proceed;
        };
        let input_context = InputContext {
            text_field_focused: key_context.text_field_focused(),
            busy: key_context.editor.borrow().is_busy(),
        };
        match resolve_shortcut(shortcut_key, shortcut_modifiers(modifier), input_context) {
            Some(action) => {
                key_context.handle_shortcut(action);
                gtk4::glib::Propagation::Stop
            }
            None => gtk4::glib::Propagation::Proceed,
        }
    });
    context.window.add_controller(key_controller);
}

fn build_window(app: &Application, editor: Rc<RefCell<MemeEditor>>) -> ApplicationWindow {
    let tokens = LAYOUT_TOKENS;
    let window = ApplicationWindow::builder()
        .application(app)
        .title(WINDOW_TITLE)
        .default_width(tokens.window_default_width)
        .default_height(tokens.window_default_height)
        .build();

    let toolbar = Toolbar {
        upload: Button::with_label("Upload image"),
        random: Button::with_label("Random template"),
        add_text: Button::with_label("Add text"),
        export: Button::with_label("Export PNG"),
    };
    toolbar.export.add_css_class("suggested-action");
    let toolbar_box = GtkBox::new(Orientation::Horizontal, tokens.spacing_8);
    toolbar_box.append(&toolbar.upload);
    toolbar_box.append(&toolbar.random);
    toolbar_box.append(&toolbar.add_text);
    toolbar_box.append(&toolbar.export);

    let canvas_area = DrawingArea::new();
    canvas_area.set_hexpand(true);
    canvas_area.set_vexpand(true);
    canvas_area.set_content_width(tokens.canvas_min_width);
    canvas_area.set_content_height(tokens.canvas_min_height);
    canvas_area.set_focusable(true);

    let status_label = Label::new(None);
    status_label.set_xalign(0.0);
    status_label.set_ellipsize(gtk4::pango::EllipsizeMode::End);

    let stage = GtkBox::new(Orientation::Vertical, tokens.spacing_8);
    stage.set_hexpand(true);
    stage.append(&toolbar_box);
    stage.append(&canvas_area);
    stage.append(&status_label);

    let layers_title = Label::new(Some("Layers"));
    layers_title.set_xalign(0.0);
    layers_title.add_css_class("heading");
    let layers_empty = Label::new(Some("No text layers yet."));
    layers_empty.set_xalign(0.0);
    layers_empty.add_css_class("dim-label");
    let layers_box = GtkBox::new(Orientation::Vertical, tokens.spacing_4);
    let layers_scroller = ScrolledWindow::builder()
        .child(&layers_box)
        .min_content_height(tokens.layer_list_min_height)
        .vexpand(true)
        .build();

    let form_title = Label::new(Some("Selected layer"));
    form_title.set_xalign(0.0);
    form_title.add_css_class("heading");
    let form = LayerForm::new();

    let sidebar = GtkBox::new(Orientation::Vertical, tokens.spacing_8);
    sidebar.set_size_request(tokens.sidebar_width, -1);
    sidebar.set_valign(Align::Fill);
    sidebar.append(&layers_title);
    sidebar.append(&layers_empty);
    sidebar.append(&layers_scroller);
    sidebar.append(&form_title);
    sidebar.append(&form.container);

    let root = GtkBox::new(Orientation::Horizontal, tokens.spacing_12);
    root.set_margin_top(tokens.spacing_12);
    root.set_margin_bottom(tokens.spacing_12);
    root.set_margin_start(tokens.spacing_12);
    root.set_margin_end(tokens.spacing_12);
    root.append(&stage);
    root.append(&sidebar);
    window.set_child(Some(&root));

    let context = UiContext {
        editor,
        window: window.clone(),
        canvas_area,
        status_label,
        layers_box,
        layers_empty,
        toolbar,
        form,
        display_rect: Rc::new(Cell::new(DisplayRect::new(0.0, 0.0, 0.0, 0.0))),
        file_dialog: Rc::new(RefCell::new(None)),
    };

    let upload_context = context.clone();
    context
        .toolbar
        .upload
        .connect_clicked(move |_| upload_context.open_upload_dialog());
    let random_context = context.clone();
    context
        .toolbar
        .random
        .connect_clicked(move |_| random_context.start_random_template());
    let add_context = context.clone();
    context.toolbar.add_text.connect_clicked(move |_| {
        add_context.apply_input(EditorInput::AddText);
        add_context.form.text_view().grab_focus();
    });
    let export_context = context.clone();
    context
        .toolbar
        .export
        .connect_clicked(move |_| export_context.start_export());

    let edit_context = context.clone();
    context
        .form
        .connect_edits(move |edit| edit_context.apply_input(EditorInput::Edit(edit)));
    let delete_context = context.clone();
    context
        .form
        .connect_delete(move || delete_context.apply_input(EditorInput::DeleteActive));

    connect_canvas_draw(&context);
    connect_canvas_gestures(&context);
    connect_shortcuts(&context);
    context.refresh(FormSync::Sync);

    window
}

/// Runs the GTK application until the window closes.
pub fn run(config: AppConfig) -> AppResult<()> {
    let editor = Rc::new(RefCell::new(MemeEditor::from_config(&config)?));
    let application = Application::builder().application_id(APP_ID).build();
    let window_slot: Rc<RefCell<Option<ApplicationWindow>>> = Rc::new(RefCell::new(None));

    application.connect_activate(move |app| {
        if let Some(window) = window_slot.borrow().as_ref() {
            window.present();
            return;
        }
        let window = build_window(app, editor.clone());
        window.present();
        *window_slot.borrow_mut() = Some(window);
    });

    let args: [&str; 0] = [];
    let exit_code = application.run_with_args(&args);
    if exit_code != gtk4::glib::ExitCode::SUCCESS {
        return Err(AppError::Ui(format!(
            "GTK application exited with {exit_code:?}"
        )));
    }
    Ok(())
}
