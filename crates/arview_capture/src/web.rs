//! Browser camera via `navigator.mediaDevices.getUserMedia`.
//!
//! The stream is attached to a hidden, muted `<video>` element; frames are
//! copied out through an off-screen 2D canvas.

use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, DomException, HtmlCanvasElement, HtmlVideoElement, MediaStream,
    MediaStreamConstraints, MediaStreamTrack, MediaStreamTrackState,
};

use crate::device::{MediaDevices, TrackSettings, TrackState, VideoFrame, VideoTrack};
use crate::error::CaptureError;
use crate::profile::{ConstraintProfile, FacingMode};

#[derive(Debug, Default)]
pub struct WebMediaDevices;

impl WebMediaDevices {
    fn media_devices() -> Result<web_sys::MediaDevices, CaptureError> {
        web_sys::window()
            .ok_or(CaptureError::CameraUnavailable)?
            .navigator()
            .media_devices()
            .map_err(|_| CaptureError::CameraUnavailable)
    }
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), CaptureError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| CaptureError::Backend(format!("{e:?}")))
}

fn range(ideal: Option<u32>, max: Option<u32>) -> Result<Object, CaptureError> {
    let obj = Object::new();
    if let Some(v) = ideal {
        set(&obj, "ideal", &JsValue::from(v))?;
    }
    if let Some(v) = max {
        set(&obj, "max", &JsValue::from(v))?;
    }
    Ok(obj)
}

fn video_constraints(profile: &ConstraintProfile) -> Result<JsValue, CaptureError> {
    if profile.facing == FacingMode::Any && profile.ideal.is_none() && profile.max.is_none() {
        return Ok(JsValue::TRUE);
    }
    let video = Object::new();
    if profile.facing != FacingMode::Any {
        set(&video, "facingMode", &JsValue::from_str(profile.facing.as_str()))?;
    }
    let width = range(profile.ideal.map(|r| r.width), profile.max.map(|r| r.width))?;
    let height = range(profile.ideal.map(|r| r.height), profile.max.map(|r| r.height))?;
    set(&video, "width", &width)?;
    set(&video, "height", &height)?;
    Ok(video.into())
}

/// DOMException names from getUserMedia, mapped onto the capture taxonomy.
fn map_js_error(value: JsValue, profile: &ConstraintProfile) -> CaptureError {
    match value.dyn_ref::<DomException>().map(|e| e.name()) {
        Some(name) => match name.as_str() {
            "NotAllowedError" | "SecurityError" => CaptureError::PermissionDenied,
            "NotFoundError" => CaptureError::NoDevice,
            "NotReadableError" | "AbortError" => CaptureError::DeviceBusy,
            "OverconstrainedError" => CaptureError::Overconstrained(profile.name.clone()),
            other => CaptureError::Backend(other.to_string()),
        },
        // OverconstrainedError is not a DOMException in every browser
        None if Reflect::get(&value, &JsValue::from_str("constraint")).is_ok_and(|c| !c.is_undefined()) => {
            CaptureError::Overconstrained(profile.name.clone())
        }
        None => CaptureError::Backend(format!("{value:?}")),
    }
}

impl MediaDevices for WebMediaDevices {
    fn is_secure_context(&self) -> bool {
        web_sys::window().is_some_and(|w| w.is_secure_context())
    }

    fn has_camera_api(&self) -> bool {
        Self::media_devices().is_ok()
    }

    async fn get_user_media(
        &self,
        profile: &ConstraintProfile,
    ) -> Result<Vec<Box<dyn VideoTrack>>, CaptureError> {
        let devices = Self::media_devices()?;
        let constraints = MediaStreamConstraints::new();
        constraints.set_video(&video_constraints(profile)?);
        constraints.set_audio(&JsValue::FALSE);

        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(|e| map_js_error(e, profile))?;
        let stream: MediaStream = JsFuture::from(promise)
            .await
            .map_err(|e| map_js_error(e, profile))?
            .dyn_into()
            .map_err(|_| CaptureError::Backend("getUserMedia did not return a MediaStream".into()))?;

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(CaptureError::CameraUnavailable)?;
        let video: HtmlVideoElement = document
            .create_element("video")
            .and_then(|e| e.dyn_into().map_err(JsValue::from))
            .map_err(|e| CaptureError::Backend(format!("{e:?}")))?;
        video.set_muted(true);
        video.set_autoplay(true);
        let _ = video.set_attribute("playsinline", "");
        video.set_src_object(Some(&stream));
        let _ = video.play();

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .and_then(|e| e.dyn_into().map_err(JsValue::from))
            .map_err(|e| CaptureError::Backend(format!("{e:?}")))?;
        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into().ok())
            .ok_or_else(|| CaptureError::Backend("2d canvas unavailable".into()))?;

        let mut tracks: Vec<Box<dyn VideoTrack>> = Vec::new();
        for value in stream.get_video_tracks().iter() {
            if let Ok(track) = value.dyn_into::<MediaStreamTrack>() {
                tracks.push(Box::new(WebVideoTrack {
                    id: track.id(),
                    track,
                    facing: profile.facing,
                    video: video.clone(),
                    canvas: canvas.clone(),
                    context: context.clone(),
                }));
            }
        }
        Ok(tracks)
    }
}

pub struct WebVideoTrack {
    id: String,
    track: MediaStreamTrack,
    facing: FacingMode,
    video: HtmlVideoElement,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl VideoTrack for WebVideoTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> TrackState {
        match self.track.ready_state() {
            MediaStreamTrackState::Live => TrackState::Live,
            _ => TrackState::Ended,
        }
    }

    fn stop(&self) {
        self.track.stop();
        self.video.set_src_object(None);
    }

    fn settings(&self) -> TrackSettings {
        TrackSettings {
            width: self.video.video_width(),
            height: self.video.video_height(),
            facing: self.facing,
        }
    }

    fn grab_frame(&self) -> Option<VideoFrame> {
        if self.state() == TrackState::Ended {
            return None;
        }
        let (w, h) = (self.video.video_width(), self.video.video_height());
        if w == 0 || h == 0 {
            // metadata not loaded yet
            return None;
        }
        if self.canvas.width() != w || self.canvas.height() != h {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
        self.context
            .draw_image_with_html_video_element(&self.video, 0.0, 0.0)
            .ok()?;
        let image = self
            .context
            .get_image_data(0.0, 0.0, f64::from(w), f64::from(h))
            .ok()?;
        Some(VideoFrame {
            width: w,
            height: h,
            data: image.data().0,
        })
    }
}
