//! Compiler-provided names: intrinsic procedures, statement keywords that look
//! like function references, and intrinsic modules.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Intrinsic procedures of Fortran 2018 plus common vendor extensions.
const INTRINSIC_PROCEDURES: &[&str] = &[
    "abort", "abs", "access", "achar", "acos", "acosd", "acosh", "adjustl", "adjustr", "aimag",
    "aint", "alarm", "all", "allocated", "and", "anint", "any", "asin", "asind", "asinh",
    "associated", "atan", "atan2", "atan2d", "atand", "atanh", "atomic_add", "atomic_and",
    "atomic_cas", "atomic_define", "atomic_fetch_add", "atomic_fetch_and", "atomic_fetch_or",
    "atomic_fetch_xor", "atomic_or", "atomic_ref", "atomic_xor", "backtrace", "bessel_j0",
    "bessel_j1", "bessel_jn", "bessel_y0", "bessel_y1", "bessel_yn", "bge", "bgt", "bit_size",
    "ble", "blt", "btest", "c_associated", "c_f_pointer", "c_f_procpointer", "c_funloc",
    "c_loc", "c_sizeof", "cabs", "ceiling", "char", "chdir", "chmod", "cmplx", "co_broadcast",
    "co_max", "co_min", "co_reduce", "co_sum", "command_argument_count", "compiler_options",
    "compiler_version", "complex", "conjg", "cos", "cosd", "cosh", "cotan", "cotand", "count",
    "cpu_time", "cshift", "ctime", "date_and_time", "dabs", "dble", "dcmplx", "dconjg", "dcos",
    "dexp", "digits", "dim", "dimag", "dint", "dlog", "dmax1", "dmin1", "dot_product", "dprod",
    "dreal", "dshiftl", "dshiftr", "dsign", "dsin", "dsqrt", "dtime", "eoshift", "epsilon",
    "erf", "erfc", "erfc_scaled", "etime", "event_query", "execute_command_line", "exit", "exp",
    "exponent", "extends_type_of", "fdate", "fget", "fgetc", "findloc", "float", "floor",
    "flush", "fnum", "fput", "fputc", "fraction", "free", "fseek", "fstat", "ftell", "gamma",
    "gerror", "getarg", "get_command", "get_command_argument", "getcwd", "getenv",
    "get_environment_variable", "getgid", "getlog", "getpid", "getuid", "gmtime", "hostnm",
    "huge", "hypot", "iabs", "iachar", "iall", "iand", "iany", "iargc", "ibclr", "ibits",
    "ibset", "ichar", "idate", "idint", "idnint", "ieor", "ierrno", "ifix", "image_index",
    "imag", "index", "int", "int2", "int8", "ior", "iparity", "irand", "is_contiguous",
    "is_iostat_end", "is_iostat_eor", "isatty", "ishft", "ishftc", "isnan", "itime", "kill",
    "kind", "lbound", "lcobound", "leadz", "len", "len_trim", "lge", "lgt", "link", "lle",
    "llt", "lnblnk", "loc", "log", "log10", "log_gamma", "logical", "long", "lshift", "lstat",
    "ltime", "malloc", "maskl", "maskr", "matmul", "max", "max0", "max1", "maxexponent",
    "maxloc", "maxval", "mclock", "mclock8", "merge", "merge_bits", "min", "min0", "min1",
    "minexponent", "minloc", "minval", "mod", "modulo", "move_alloc", "mvbits", "nearest",
    "new_line", "nint", "norm2", "not", "null", "num_images", "or", "pack", "parity", "perror",
    "popcnt", "poppar", "precision", "present", "product", "radix", "ran", "rand",
    "random_init", "random_number", "random_seed", "range", "rank", "real", "rename", "repeat",
    "reshape", "rrspacing", "rshift", "same_type_as", "scale", "scan", "secnds", "second",
    "selected_char_kind", "selected_int_kind", "selected_real_kind", "set_exponent", "shape",
    "shifta", "shiftl", "shiftr", "short", "sign", "signal", "sin", "sind", "sinh", "size",
    "sizeof", "sleep", "sngl", "spacing", "spread", "sqrt", "srand", "stat", "storage_size",
    "sum", "symlnk", "system", "system_clock", "tan", "tand", "tanh", "this_image", "time",
    "time8", "tiny", "trailz", "transfer", "transpose", "trim", "ttynam", "ubound", "ucobound",
    "umask", "unlink", "unpack", "verify", "xor", "zabs", "zcos", "zexp", "zlog", "zsin",
    "zsqrt",
];

/// Statement keywords followed by parentheses, which the call scanner would
/// otherwise take for function references.
const KEYWORDS: &[&str] = &[
    "allocate", "assign", "backspace", "block", "call", "case", "change", "character", "class",
    "close", "complex", "concurrent", "critical", "deallocate", "default", "dimension", "do",
    "double", "else", "elseif", "elsewhere", "end", "endfile", "entry", "error", "event",
    "fail", "forall", "form", "format", "go", "goto", "if", "image", "images", "inquire",
    "integer", "intent", "is", "lock", "memory", "nullify", "open", "post", "print",
    "procedure", "read", "real", "return", "rewind", "select", "stop", "sync", "team", "then",
    "type", "unlock", "wait", "where", "while", "write",
];

/// Intrinsic modules with their reference documentation.
pub const INTRINSIC_MODULES: &[(&str, &str)] = &[
    ("iso_fortran_env", "http://fortranwiki.org/fortran/show/iso_fortran_env"),
    ("iso_c_binding", "http://fortranwiki.org/fortran/show/iso_c_binding"),
    ("ieee_arithmetic", "http://fortranwiki.org/fortran/show/ieee_arithmetic"),
    ("ieee_exceptions", "http://fortranwiki.org/fortran/show/IEEE+arithmetic"),
    ("ieee_features", "http://fortranwiki.org/fortran/show/IEEE+arithmetic"),
    (
        "openacc",
        "https://www.openacc.org/sites/default/files/inline-images/Specification/OpenACC.3.0.pdf#page=85",
    ),
    ("omp_lib", "https://www.openmp.org/spec-html/5.1/openmpch3.html#x156-1890003"),
    ("mpi", "http://www.mpi-forum.org/docs/mpi-3.1/mpi31-report/node410.htm"),
    ("mpi_f08", "http://www.mpi-forum.org/docs/mpi-3.1/mpi31-report/node409.htm"),
];

static INTRINSIC_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    INTRINSIC_PROCEDURES
        .iter()
        .chain(KEYWORDS)
        .copied()
        .collect()
});

/// Whether `name` is an intrinsic procedure or a keyword, case-insensitively.
#[must_use]
pub fn is_intrinsic(name: &str) -> bool {
    INTRINSIC_SET.contains(name.to_ascii_lowercase().as_str())
}

/// Reference page of an intrinsic module.
#[must_use]
pub fn intrinsic_module_url(name: &str) -> Option<&'static str> {
    INTRINSIC_MODULES
        .iter()
        .find(|(module, _)| module.eq_ignore_ascii_case(name))
        .map(|(_, url)| *url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_lookup_ignores_case() {
        assert!(is_intrinsic("SIZE"));
        assert!(is_intrinsic("allocate"));
        assert!(is_intrinsic("If"));
        assert!(!is_intrinsic("my_solver"));
    }

    #[test]
    fn test_intrinsic_modules() {
        assert!(intrinsic_module_url("ISO_C_BINDING").is_some());
        assert!(intrinsic_module_url("mpi_f08").is_some());
        assert!(intrinsic_module_url("my_mod").is_none());
    }
}
