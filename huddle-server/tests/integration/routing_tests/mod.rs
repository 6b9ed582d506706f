mod test_forwarding;
mod test_malformed_frames;
