// Fourcc tables for OggDS video streams

const AVC_FOURCCS: [&[u8; 4]; 6] = [b"avc1", b"AVC1", b"h264", b"H264", b"x264", b"X264"];

const MPEG4_P2_FOURCCS: [&[u8; 4]; 10] = [
    b"MP42", b"DIV2", b"DIVX", b"XVID", b"DX50", b"FMP4", b"DXGM", b"MP4V", b"3IV2", b"DIV3",
];

/// Fourccs under which h.264 is stored in VfW mode
pub fn is_avc_fourcc(fourcc: &[u8; 4]) -> bool {
    AVC_FOURCCS.iter().any(|candidate| *candidate == fourcc)
}

/// MPEG-4 part 2 fourccs, compared case-insensitively
pub fn is_mpeg4_p2_fourcc(fourcc: &[u8; 4]) -> bool {
    MPEG4_P2_FOURCCS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(fourcc))
}
