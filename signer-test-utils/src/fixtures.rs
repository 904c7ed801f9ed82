//! Known-good digests for the signer pipeline

/// `chk(x) ~ chk(secure_hash(x))` for `x = 0`
pub const SINGLE_HASH_OF_0: &str = "4108050209~502633748";

/// Multi hash of [`SINGLE_HASH_OF_0`]
pub const MULTI_HASH_OF_0: &str =
    "29568666068035183841425683795340791879727309630931025356555";

/// Final digest for inputs `0, 1`
pub const GOLDEN_0_1: &str = "29568666068035183841425683795340791879727309630931025356555_\
4958044192186797981418233587017209679042592862002427381542";

/// Final digest for inputs `0, 1, 2, 3, 4, 5`
pub const GOLDEN_0_TO_5: &str = "134160622214910211981638367438198914151832445908675415182_\
1696913515191343735512658979631549563179965036907783101867_\
27225454331033649287118297354036464389062965355426795162684_\
29568666068035183841425683795340791879727309630931025356555_\
3994492081516972096677631278379039212655368881548151736_\
4958044192186797981418233587017209679042592862002427381542";

/// Final digest for inputs `0, 1, 1, 2, 3, 5, 8`
pub const GOLDEN_FIBONACCI: &str = "1173136728138862632818075107442090076184424490584241521304_\
1696913515191343735512658979631549563179965036907783101867_\
27225454331033649287118297354036464389062965355426795162684_\
29568666068035183841425683795340791879727309630931025356555_\
3994492081516972096677631278379039212655368881548151736_\
4958044192186797981418233587017209679042592862002427381542_\
4958044192186797981418233587017209679042592862002427381542";

/// Inputs matching [`GOLDEN_FIBONACCI`]
pub const FIBONACCI_INPUT: [i64; 7] = [0, 1, 1, 2, 3, 5, 8];
