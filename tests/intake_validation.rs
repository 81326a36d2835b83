mod common;

use common::{durian_response, png_bytes, png_candidate, stage, workflow, FakeService};
use leaf_check::{error::ValidationError, intake::FileCandidate};

const TEN_MIB: usize = 10 * 1024 * 1024;

#[tokio::test]
async fn disallowed_types_are_rejected_and_nothing_is_staged() {
    let wf = workflow(FakeService::replying(durian_response()));
    for mime in ["text/plain", "image/webp", "application/pdf", "image/svg+xml", ""] {
        let err = wf
            .select_file(FileCandidate::new("leaf", mime, png_bytes(2, 2)))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ValidationError::UnsupportedType { ref mime_type } if mime_type == mime),
            "{mime}: {err:?}"
        );
        assert!(wf.selected_file().is_none());
    }

    let view = wf.view();
    assert!(!view.show_actions);
    assert!(!view.submit_enabled);
    assert_eq!(
        view.error.expect("error shown").message,
        "Please select a valid image file (PNG, JPG, JPEG, GIF, BMP)"
    );
}

#[tokio::test]
async fn rejection_keeps_the_previous_selection() {
    let wf = workflow(FakeService::replying(durian_response()));
    stage(&wf, "first.png").await;

    let err = wf
        .select_file(FileCandidate::new("notes.txt", "text/plain", b"hello".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::UnsupportedType { .. }));

    let staged = wf.selected_file().expect("still staged");
    assert_eq!(staged.name, "first.png");
    assert!(wf.view().preview.is_some());
}

#[tokio::test]
async fn oversized_files_are_rejected() {
    let wf = workflow(FakeService::replying(durian_response()));
    let err = wf
        .select_file(FileCandidate::new("big.png", "image/png", vec![0; TEN_MIB + 1]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ValidationError::TooLarge {
            size: TEN_MIB as u64 + 1,
            limit: TEN_MIB as u64,
        }
    );
    assert!(wf.selected_file().is_none());
    assert_eq!(
        wf.view().error.expect("error shown").message,
        "File size must be less than 10MB"
    );
}

#[tokio::test]
async fn limit_is_inclusive_and_undecodable_files_stay_staged() {
    let wf = workflow(FakeService::replying(durian_response()));
    let staged = wf
        .select_file(FileCandidate::new("edge.jpg", "image/jpeg", vec![0; TEN_MIB]))
        .await
        .expect("exactly at the limit");
    assert_eq!(staged.size_bytes, TEN_MIB as u64);

    let view = wf.view();
    assert!(view.preview.is_none());
    assert!(view.submit_enabled);
    assert_eq!(view.file.expect("file shown").size_label, "10 MB");
}

#[tokio::test]
async fn valid_file_is_staged_with_preview() {
    let wf = workflow(FakeService::replying(durian_response()));
    let staged = wf
        .select_file(FileCandidate::new("leaf.png", "IMAGE/PNG", png_bytes(4, 3)))
        .await
        .expect("staged");
    assert_eq!(staged.name, "leaf.png");

    let view = wf.view();
    let preview = view.preview.expect("preview decoded");
    assert_eq!((preview.width, preview.height), (4, 3));
    assert!(preview.data_url.starts_with("data:IMAGE/PNG;base64,"));
    assert!(view.show_actions);
    assert!(view.submit_enabled);
    assert_eq!(view.submit_label, "Classify Leaf");
    assert!(view.error.is_none());
}

#[tokio::test]
async fn successful_selection_clears_the_error() {
    let wf = workflow(FakeService::replying(durian_response()));
    let _ = wf
        .select_file(FileCandidate::new("a.txt", "text/plain", vec![1]))
        .await;
    assert!(wf.view().error.is_some());

    stage(&wf, "leaf.png").await;
    assert!(wf.view().error.is_none());
}

#[tokio::test]
async fn drop_considers_only_the_first_file() {
    let wf = workflow(FakeService::replying(durian_response()));

    let dropped = wf.select_dropped(Vec::new()).await.expect("empty drop");
    assert!(dropped.is_none());
    assert!(wf.selected_file().is_none());

    let staged = wf
        .select_dropped(vec![
            png_candidate("first.png"),
            FileCandidate::new("second.txt", "text/plain", vec![1, 2, 3]),
        ])
        .await
        .expect("first is valid")
        .expect("staged");
    assert_eq!(staged.name, "first.png");

    let err = wf
        .select_dropped(vec![
            FileCandidate::new("bad.txt", "text/plain", vec![1]),
            png_candidate("good.png"),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::UnsupportedType { .. }));
    assert_eq!(wf.selected_file().expect("unchanged").name, "first.png");
}

#[tokio::test]
async fn remove_file_clears_selection() {
    let wf = workflow(FakeService::replying(durian_response()));
    stage(&wf, "leaf.png").await;
    wf.remove_file();

    let view = wf.view();
    assert!(view.file.is_none());
    assert!(view.preview.is_none());
    assert!(!view.show_actions);
    assert!(!view.submit_enabled);
}

#[test]
fn candidate_from_path_infers_mime() {
    let dir = std::env::temp_dir().join(format!("leaf-check-intake-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("Leaf.JPEG");
    std::fs::write(&path, [1u8, 2, 3]).expect("write sample");

    let candidate = FileCandidate::from_path(&path).expect("read sample");
    assert_eq!(candidate.name, "Leaf.JPEG");
    assert_eq!(candidate.mime_type, "image/jpeg");
    assert_eq!(candidate.bytes, vec![1, 2, 3]);

    assert!(FileCandidate::from_path(&dir.join("missing.png")).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
