use recolor::{
    ColorRgb, ExecutionDomain, Frame, ImageFrame, MaskChannel, NodeContract, PixelFormat,
    RecolorError, RecolorNode, RecolorOptions, TAG_IMAGE, TAG_IMAGE_GPU, TAG_MASK, TAG_MASK_GPU,
    Timestamp,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn options() -> RecolorOptions {
    RecolorOptions::from_json_str(r#"{ "color": { "r": 0, "g": 0, "b": 255 } }"#).unwrap()
}

fn image(rgb: [u8; 3]) -> Frame {
    Frame::Cpu(ImageFrame::filled(4, 3, PixelFormat::Rgb8, &rgb).unwrap())
}

fn mask(v: u8) -> Frame {
    Frame::Cpu(ImageFrame::filled(2, 2, PixelFormat::Gray8, &[v]).unwrap())
}

#[test]
fn sequence_keeps_timestamps_and_skips_unmasked_frames() {
    init_tracing();
    let mut node = RecolorNode::open(&NodeContract::cpu(), &options()).unwrap();
    assert_eq!(node.domain(), ExecutionDomain::Cpu);

    let masks = [Some(mask(255)), None, Some(mask(0)), None, Some(mask(255))];
    let mut emitted = Vec::new();
    for (i, m) in masks.iter().enumerate() {
        let ts = Timestamp(1000 + i as i64 * 33);
        if let Some(packet) = node.process(ts, &image([100, 150, 200]), m.as_ref()).unwrap() {
            emitted.push(packet);
        }
    }

    let stamps: Vec<_> = emitted.iter().map(|p| p.timestamp).collect();
    assert_eq!(stamps, vec![Timestamp(1000), Timestamp(1066), Timestamp(1132)]);

    let first = emitted[0].frame.as_cpu().unwrap();
    assert_eq!(first.dimensions(), (4, 3));
    assert_eq!(first.pixel(3, 2), &[45, 67, 230]);

    let untouched = emitted[1].frame.as_cpu().unwrap();
    assert_eq!(untouched.pixel(0, 0), &[100, 150, 200]);

    node.close().unwrap();
}

#[test]
fn options_json_selects_alpha_channel() {
    init_tracing();
    let opts = RecolorOptions::from_json_str(
        r#"{ "color": { "r": 0, "g": 0, "b": 0 }, "mask_channel": "ALPHA" }"#,
    )
    .unwrap();
    assert_eq!(opts.mask_channel, MaskChannel::Alpha);

    let mut node = RecolorNode::open(&NodeContract::cpu(), &opts).unwrap();
    let white = image([255, 255, 255]);
    let m = Frame::Cpu(ImageFrame::filled(4, 3, PixelFormat::Rgba8, &[255, 255, 255, 0]).unwrap());

    let out = node
        .process(Timestamp(0), &white, Some(&m))
        .unwrap()
        .unwrap();
    assert_eq!(out.frame.as_cpu().unwrap().pixel(0, 0), &[255, 255, 255]);
}

#[test]
fn contract_errors_surface_at_open() {
    let mixed = NodeContract::new([TAG_IMAGE, TAG_MASK_GPU], [TAG_IMAGE]);
    let err = RecolorNode::open(&mixed, &options()).unwrap_err();
    assert!(matches!(err, RecolorError::Config(_)));
    assert!(err.to_string().starts_with("configuration error:"));

    let mixed = NodeContract::new([TAG_IMAGE_GPU, TAG_MASK], [TAG_IMAGE_GPU]);
    assert!(RecolorNode::open(&mixed, &options()).is_err());

    let no_mask = NodeContract::new([TAG_IMAGE], [TAG_IMAGE]);
    assert!(RecolorNode::open(&no_mask, &options()).is_err());
}

#[test]
fn out_of_range_color_fails_open() {
    let opts = RecolorOptions::new(ColorRgb { r: 0, g: 256, b: 0 });
    let err = RecolorNode::open(&NodeContract::cpu(), &opts).unwrap_err();
    assert!(matches!(err, RecolorError::Config(_)));
}

#[test]
fn unknown_mask_channel_behaves_as_red() {
    init_tracing();
    let opts = RecolorOptions::from_json_str(
        r#"{ "color": { "r": 0, "g": 0, "b": 0 }, "mask_channel": "GREEN" }"#,
    )
    .unwrap();
    assert_eq!(opts.mask_channel, MaskChannel::Unknown);

    let mut node = RecolorNode::open(&NodeContract::cpu(), &opts).unwrap();
    let white = image([255, 255, 255]);
    let m = Frame::Cpu(ImageFrame::filled(4, 3, PixelFormat::Rgba8, &[0, 255, 255, 255]).unwrap());
    let out = node
        .process(Timestamp(0), &white, Some(&m))
        .unwrap()
        .unwrap();
    assert_eq!(out.frame.as_cpu().unwrap().pixel(0, 0), &[255, 255, 255]);
}

#[test]
fn precondition_error_stops_the_stream() {
    init_tracing();
    let mut node = RecolorNode::open(&NodeContract::cpu(), &options()).unwrap();
    let rgba = Frame::Cpu(ImageFrame::filled(2, 2, PixelFormat::Rgba8, &[1, 2, 3, 4]).unwrap());
    let err = node.process(Timestamp(0), &rgba, Some(&mask(255))).unwrap_err();
    assert!(matches!(err, RecolorError::Precondition(_)));
    assert!(node.is_failed());

    // a valid pair after the failure is rejected too
    let err = node
        .process(Timestamp(1), &image([1, 2, 3]), Some(&mask(255)))
        .unwrap_err();
    assert!(matches!(err, RecolorError::Precondition(_)));
    assert!(err.to_string().contains("earlier failure"));

    node.close().unwrap();
}

#[test]
fn transient_mask_absence_is_not_a_failure() {
    let mut node = RecolorNode::open(&NodeContract::cpu(), &options()).unwrap();
    for ts in 0..3 {
        assert!(node.process(Timestamp(ts), &image([9, 9, 9]), None).unwrap().is_none());
    }
    assert!(!node.is_failed());
    assert!(
        node.process(Timestamp(3), &image([9, 9, 9]), Some(&mask(255)))
            .unwrap()
            .is_some()
    );
}
