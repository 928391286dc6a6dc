//! End-to-end piano scenarios on a device-less audio context.

use keytone::audio::SAMPLE_RATE;
use keytone::piano::{KeyCode, Row};
use keytone::{AudioContext, NoteTable, Session};
use std::io::Cursor;
use std::sync::Arc;

fn offline_session() -> Session {
    let ctx = AudioContext::offline(SAMPLE_RATE);
    Session::with_context(ctx, None, Arc::new(NoteTable::default())).unwrap()
}

fn render(session: &Session, frames: usize) -> Vec<f32> {
    let mut out = vec![0.0; frames];
    session.context().render(&mut out);
    out
}

#[test]
fn natural_key_sounds_while_held() {
    let mut session = offline_session();
    // Y plays A4 at 220 Hz, the sixth natural key
    let key = KeyCode::new(89);
    let index = session.dispatcher().table().position(Row::Natural, key).unwrap();
    assert_eq!(session.dispatcher().table().row(Row::Natural)[index].label, "A4");

    assert!(session.dispatcher_mut().on_key_down(key));
    let element = session.dispatcher().element(Row::Natural, index).unwrap();
    assert!(element.class_name().split(' ').any(|c| c == "playing"));
    assert!(session.dispatcher().is_sounding(Row::Natural, index));
    assert!(render(&session, 512).iter().any(|s| s.abs() > 0.0));

    assert!(session.dispatcher_mut().on_key_up(key));
    let element = session.dispatcher().element(Row::Natural, index).unwrap();
    assert_eq!(element.class_name(), "white");
    assert!(!session.dispatcher().is_sounding(Row::Natural, index));
    assert!(render(&session, 512).iter().all(|s| *s == 0.0));
}

#[test]
fn every_natural_key_starts_and_stops_its_voice() {
    let mut session = offline_session();
    let keys: Vec<(usize, KeyCode)> = session
        .dispatcher()
        .table()
        .row(Row::Natural)
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.key.map(|k| (i, k)))
        .collect();

    for (index, key) in keys {
        session.dispatcher_mut().on_key_down(key);
        assert!(session.dispatcher().is_sounding(Row::Natural, index), "{key}");
        session.dispatcher_mut().on_key_up(key);
        assert!(!session.dispatcher().is_sounding(Row::Natural, index), "{key}");
    }
    assert_eq!(session.context().bus_connection_count(), 0);
}

#[test]
fn hidden_host_releases_held_note() {
    let mut session = offline_session();
    // P plays E4
    let key = KeyCode::new(80);
    let index = session.dispatcher().table().position(Row::Natural, key).unwrap();
    assert_eq!(session.dispatcher().table().row(Row::Natural)[index].label, "E4");

    session.dispatcher_mut().on_key_down(key);
    session.dispatcher_mut().on_key_down(KeyCode::new(65)); // G#4
    session.on_visibility_change(true);

    assert_eq!(session.dispatcher().sounding_count(), 0);
    assert!(!session
        .dispatcher()
        .element(Row::Natural, index)
        .unwrap()
        .is_playing());

    // Stopping again is a no-op
    session.dispatcher_mut().stop_all();
    assert_eq!(session.dispatcher().sounding_count(), 0);
}

#[test]
fn recording_holds_only_audio_between_start_and_stop() {
    let mut session = offline_session();
    session.dispatcher_mut().on_key_down(KeyCode::new(81));

    // Audio before start is not captured
    render(&session, 4096);

    session.start_recording().unwrap();
    render(&session, 1000);
    render(&session, 500);
    let recording = session.stop_recording().unwrap().unwrap().clone();

    // Audio after stop is not captured either
    render(&session, 4096);

    assert_eq!(recording.frame_count(), 1500);
    assert_eq!(recording.file_name(), "audio-1.wav");

    let reader = hound::WavReader::new(Cursor::new(recording.wav_bytes().to_vec())).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
    let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), 3000);
    assert!(samples.iter().any(|s| *s != 0));

    assert_eq!(session.recorder().sessions().len(), 1);
    assert!(!session.is_recording());
}

#[test]
fn recording_without_notes_is_silent() {
    let mut session = offline_session();
    session.start_recording().unwrap();
    render(&session, 256);
    let recording = session.stop_recording().unwrap().unwrap().clone();

    let reader = hound::WavReader::new(Cursor::new(recording.wav_bytes().to_vec())).unwrap();
    assert!(reader.into_samples::<i16>().all(|s| s.unwrap() == 0));
}
