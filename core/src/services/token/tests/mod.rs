//! Tests for the refresh token services

mod codec_tests;
