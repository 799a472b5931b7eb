mod read;
mod sample;

mod test_util;
